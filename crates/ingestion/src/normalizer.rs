//! Record normalization.
//!
//! Maps rows with arbitrary source column names onto the canonical candidate
//! and stats shapes. Each canonical field has a fixed, ordered alias list; the
//! first alias present in the row wins even when its cell is empty. Mapping is
//! total: unresolved or uncoercible fields become `None`.

use crate::table::Row;
use screener_core::{parse_profit_factor, CandidateRecord, Cell, Hold, RankingStats, RiskOverlay};

pub const UNIVERSE_ALIASES: &[&str] = &["universe", "Universe", "index", "market", "basket"];
pub const SYMBOL_ALIASES: &[&str] = &["symbol", "Symbol", "ticker", "Ticker", "sym"];
pub const BUY_ALIASES: &[&str] = &["buy", "Buy", "entry", "entry_price"];
pub const SL_ALIASES: &[&str] = &["sl", "SL", "stop", "stop_loss"];
pub const TP_ALIASES: &[&str] = &["tp", "TP", "target", "take_profit"];
pub const RR_ALIASES: &[&str] = &["rr", "RR", "crv", "r_multiple"];
pub const HOLD_ALIASES: &[&str] = &["hold", "Hold", "hold_bars", "hold_days"];
pub const SHARES_ALIASES: &[&str] = &["shares", "Shares", "qty", "size"];
pub const RISK_USD_ALIASES: &[&str] = &["risk_usd", "risk", "risk$"];
pub const FEE_USD_ALIASES: &[&str] = &["fee_usd", "fees", "fee"];
pub const OVERLAY_ALIASES: &[&str] = &["overlay", "risk_overlay"];

pub const STATS_SYMBOL_ALIASES: &[&str] = &["symbol", "Symbol", "ticker"];
pub const TRADES_ALIASES: &[&str] = &["trades", "n_trades", "Trades"];
pub const SCORE_ALIASES: &[&str] = &["score", "Score"];
pub const MEAN_R_ALIASES: &[&str] = &["mean_R", "meanR", "mean_r", "avg_R"];
pub const PF_ALIASES: &[&str] = &["profit_factor", "pf", "PF"];

/// First alias present in the row, including present-but-null.
fn resolve<'a>(row: &'a Row, aliases: &[&str]) -> Option<&'a Cell> {
    aliases.iter().find_map(|alias| row.get(alias))
}

/// Numeric value, accepting comma as decimal separator.
pub fn coerce_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) if v.is_finite() => Some(*v),
        Cell::Number(_) | Cell::Null => None,
        Cell::Text(t) => Cell::parse_locale(t).as_f64().filter(|v| v.is_finite()),
    }
}

/// Identifier under the first present alias, as the source wrote it.
///
/// Reads the raw text rather than the typed cell so "0700" stays "0700".
fn resolve_id(row: &Row, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| row.raw(alias))
        .map(str::to_string)
}

fn coerce_count(cell: &Cell) -> Option<u32> {
    coerce_f64(cell)
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32)
}

fn coerce_shares(cell: &Cell) -> Option<i64> {
    coerce_f64(cell).map(|v| v.round() as i64)
}

/// Integral number -> bars; `"a-b"`, `"a-bd"` or `"Nd"` -> day range.
pub fn coerce_hold(cell: &Cell) -> Option<Hold> {
    match cell {
        Cell::Number(v) if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 => Some(Hold::Bars(*v as u32)),
        Cell::Text(t) => parse_day_range(t),
        _ => None,
    }
}

fn parse_day_range(text: &str) -> Option<Hold> {
    let t = text.trim();
    let is_unit = |c: char| c == 'd' || c == 'D';
    let has_unit = t.ends_with(is_unit);
    let t = t.trim_end_matches(is_unit).trim();
    let parse = |s: &str| s.trim().parse::<u32>().ok();

    match t.split_once(|c: char| c == '-' || c == '\u{2013}') {
        Some((lo, hi)) => {
            let (min, max) = (parse(lo)?, parse(hi)?);
            (min <= max).then_some(Hold::Days { min, max })
        }
        None if has_unit => parse(t).map(|n| Hold::Days { min: n, max: n }),
        None => parse(t).map(Hold::Bars),
    }
}

fn field_f64(row: &Row, aliases: &[&str]) -> Option<f64> {
    resolve(row, aliases).and_then(coerce_f64)
}

/// Map a raw row onto a candidate record.
///
/// `default_universe` applies only when the row has no universe column at all;
/// a present but empty universe stays empty.
pub fn normalize_candidate(row: &Row, default_universe: &str) -> CandidateRecord {
    let universe = resolve_id(row, UNIVERSE_ALIASES)
        .unwrap_or_else(|| default_universe.trim().to_string());
    let symbol = resolve_id(row, SYMBOL_ALIASES).unwrap_or_default();

    let buy = field_f64(row, BUY_ALIASES);
    let sl = field_f64(row, SL_ALIASES);
    let tp = field_f64(row, TP_ALIASES);
    let rr = field_f64(row, RR_ALIASES).or_else(|| CandidateRecord::derive_rr(buy, sl, tp));

    CandidateRecord {
        universe,
        symbol,
        buy,
        sl,
        tp,
        rr,
        hold: resolve(row, HOLD_ALIASES).and_then(coerce_hold),
        shares: resolve(row, SHARES_ALIASES).and_then(coerce_shares),
        risk_usd: field_f64(row, RISK_USD_ALIASES),
        fee_usd: field_f64(row, FEE_USD_ALIASES),
        stats: None,
        overlay: None,
    }
}

/// Map a JSON object onto a candidate record, carrying any risk overlay through.
pub fn normalize_json_candidate(
    object: &serde_json::Map<String, serde_json::Value>,
    default_universe: &str,
) -> CandidateRecord {
    let mut record = normalize_candidate(&Row::from_json_object(object), default_universe);
    record.overlay = OVERLAY_ALIASES
        .iter()
        .find_map(|alias| object.get(*alias))
        .filter(|v| !v.is_null())
        .map(|v| RiskOverlay(v.clone()));
    record
}

/// Map a stats row onto `(symbol, stats)`. Rows without a symbol yield `None`.
pub fn normalize_stats(row: &Row) -> Option<(String, RankingStats)> {
    let symbol = resolve_id(row, STATS_SYMBOL_ALIASES).filter(|s| !s.is_empty())?;

    let pf = resolve(row, PF_ALIASES).and_then(|cell| match cell {
        Cell::Text(t) => parse_profit_factor(t),
        other => coerce_f64(other),
    });

    let stats = RankingStats {
        trades: resolve(row, TRADES_ALIASES).and_then(coerce_count),
        score: field_f64(row, SCORE_ALIASES),
        mean_r: field_f64(row, MEAN_R_ALIASES),
        pf,
    };
    Some((symbol, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_table, TableParser};
    use approx::assert_relative_eq;

    fn row(pairs: &[(&str, Cell)]) -> Row {
        Row::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())))
    }

    #[test]
    fn test_canonical_columns() {
        let table = parse_table("universe,symbol,buy,sl,tp,hold,shares,risk_usd,fee_usd\ndax,ABC,100,90,130,12,50,500,2.5\n");
        let record = normalize_candidate(&table.rows()[0], "");
        assert_eq!(record.universe, "dax");
        assert_eq!(record.symbol, "ABC");
        assert_eq!(record.buy, Some(100.0));
        assert_relative_eq!(record.rr.unwrap(), 3.0);
        assert_eq!(record.hold, Some(Hold::Bars(12)));
        assert_eq!(record.shares, Some(50));
        assert_eq!(record.risk_usd, Some(500.0));
        assert_eq!(record.fee_usd, Some(2.5));
        assert!(record.stats.is_none());
    }

    #[test]
    fn test_alias_priority_first_present_wins() {
        // "entry" is null but listed before "entry_price": it still wins.
        let r = row(&[
            ("ticker", Cell::Text("XYZ".into())),
            ("entry_price", Cell::Number(50.0)),
            ("entry", Cell::Null),
        ]);
        let record = normalize_candidate(&r, "sp500");
        assert_eq!(record.symbol, "XYZ");
        assert_eq!(record.universe, "sp500");
        assert_eq!(record.buy, None);
    }

    #[test]
    fn test_comma_decimal_accepted() {
        let table = TableParser::new(';').parse("symbol;buy;sl;tp\nABC;10,5;9,5;12,5\n");
        let record = normalize_candidate(&table.rows()[0], "dax");
        assert_eq!(record.buy, Some(10.5));
        assert_eq!(record.sl, Some(9.5));
        assert_relative_eq!(record.rr.unwrap(), 2.0);
    }

    #[test]
    fn test_explicit_rr_wins_over_derived() {
        let r = row(&[
            ("symbol", Cell::Text("A".into())),
            ("buy", Cell::Number(100.0)),
            ("sl", Cell::Number(90.0)),
            ("tp", Cell::Number(130.0)),
            ("rr", Cell::Number(1.7)),
        ]);
        assert_eq!(normalize_candidate(&r, "x").rr, Some(1.7));
    }

    #[test]
    fn test_rr_null_when_stop_above_entry() {
        let r = row(&[
            ("symbol", Cell::Text("A".into())),
            ("buy", Cell::Number(100.0)),
            ("sl", Cell::Number(105.0)),
            ("tp", Cell::Number(130.0)),
        ]);
        assert_eq!(normalize_candidate(&r, "x").rr, None);
    }

    #[test]
    fn test_unresolved_fields_are_none() {
        let record = normalize_candidate(&row(&[("foo", Cell::Number(1.0))]), "");
        assert_eq!(record, CandidateRecord::new("", ""));
    }

    #[test]
    fn test_hold_day_ranges() {
        assert_eq!(coerce_hold(&Cell::Text("3-5".into())), Some(Hold::Days { min: 3, max: 5 }));
        assert_eq!(coerce_hold(&Cell::Text("3\u{2013}5d".into())), Some(Hold::Days { min: 3, max: 5 }));
        assert_eq!(coerce_hold(&Cell::Text("4d".into())), Some(Hold::Days { min: 4, max: 4 }));
        assert_eq!(coerce_hold(&Cell::Number(7.0)), Some(Hold::Bars(7)));
        assert_eq!(coerce_hold(&Cell::Number(7.5)), None);
        assert_eq!(coerce_hold(&Cell::Text("5-3".into())), None);
        assert_eq!(coerce_hold(&Cell::Text("soon".into())), None);
    }

    #[test]
    fn test_numeric_symbol_rendered_as_text() {
        let table = parse_table("symbol,universe\n7203,nikkei\n");
        assert_eq!(normalize_candidate(&table.rows()[0], "").symbol, "7203");
    }

    #[test]
    fn test_numeric_looking_ids_keep_source_text() {
        let table = parse_table("universe,symbol\nhk,0700\nkr,005930\nx,1E5\n");
        let symbols: Vec<_> = table
            .rows()
            .iter()
            .map(|r| normalize_candidate(r, "").symbol)
            .collect();
        assert_eq!(symbols, vec!["0700", "005930", "1E5"]);

        let stats = parse_table("symbol,trades\n0700,25\n");
        assert_eq!(normalize_stats(&stats.rows()[0]).unwrap().0, "0700");

        let value = serde_json::json!({"universe": "hk", "symbol": "0700"});
        assert_eq!(normalize_json_candidate(value.as_object().unwrap(), "").symbol, "0700");
    }

    #[test]
    fn test_empty_universe_column_does_not_fall_back() {
        let table = parse_table("universe,symbol\n,ABC\n");
        assert_eq!(normalize_candidate(&table.rows()[0], "dax").universe, "");

        let table = parse_table("symbol\nABC\n");
        assert_eq!(normalize_candidate(&table.rows()[0], " dax ").universe, "dax");
    }

    #[test]
    fn test_json_candidate_keeps_overlay() {
        let value = serde_json::json!({
            "symbol": "ABC",
            "buy": "100",
            "sl": 90,
            "tp": 130,
            "overlay": {"regime": "risk_off"}
        });
        let record = normalize_json_candidate(value.as_object().unwrap(), "dax");
        assert_eq!(record.buy, Some(100.0));
        assert_relative_eq!(record.rr.unwrap(), 3.0);
        assert_eq!(
            record.overlay,
            Some(RiskOverlay(serde_json::json!({"regime": "risk_off"})))
        );
    }

    #[test]
    fn test_stats_row() {
        let table = parse_table("symbol,trades,score,mean_R,profit_factor\nABC,30,2.1,0.12,1.4\nDEF,8,0.3,-0.1,inf\n,1,1,1,1\n");
        let (symbol, stats) = normalize_stats(&table.rows()[0]).unwrap();
        assert_eq!(symbol, "ABC");
        assert_eq!(stats.trades, Some(30));
        assert_eq!(stats.score, Some(2.1));
        assert_eq!(stats.mean_r, Some(0.12));
        assert_eq!(stats.pf, Some(1.4));

        let (_, def) = normalize_stats(&table.rows()[1]).unwrap();
        assert_eq!(def.pf, Some(f64::INFINITY));

        assert!(normalize_stats(&table.rows()[2]).is_none());
    }

    #[test]
    fn test_negative_trades_rejected() {
        let r = row(&[("symbol", Cell::Text("A".into())), ("trades", Cell::Number(-3.0))]);
        assert_eq!(normalize_stats(&r).unwrap().1.trades, None);
    }
}
