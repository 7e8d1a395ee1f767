use scan_core::{DividendScanResult, DividendStock, RiskLevel};

use crate::blocks::{DigestBlock, TextObject};

/// Render a scan result as Slack Block Kit blocks.
///
/// One section block carries the whole digest: a title line with the stock
/// count (and the HIGH-risk exclusion count when nonzero), then one line per
/// stock. An empty result becomes a single notice naming the scan window.
pub fn format_for_slack(result: &DividendScanResult) -> Vec<DigestBlock> {
    if result.stocks.is_empty() {
        return vec![build_empty_notice(result)];
    }

    let bullet_list = result
        .stocks
        .iter()
        .map(|stock| format!("  {}", format_stock_line(stock)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut title = format!("Upcoming US ex-dividend dates ({} stocks)", result.stocks.len());
    if result.high_risk_excluded > 0 {
        title.push_str(&format!(
            " | {} HIGH risk excluded",
            result.high_risk_excluded
        ));
    }

    let markdown = format!(":moneybag: *{title}*\n{bullet_list}");
    vec![DigestBlock::section(TextObject::mrkdwn(markdown))]
}

/// One digest line: risk glyph, clickable ticker, yield, a short indicator
/// readout, and the net-profit figure with a warning marker when negative.
fn format_stock_line(stock: &DividendStock) -> String {
    let glyph = risk_glyph(stock);
    let link = format!("<{}|{}>", stock.reference_url, stock.ticker);
    let mut line = format!("{glyph} {link} - dividend {:.1}%", stock.dividend_yield);

    if let Some(indicators) = &stock.indicators {
        let mut parts: Vec<String> = Vec::new();
        if let Some(rsi) = indicators.rsi_14 {
            parts.push(format!("RSI {rsi:.0}"));
        }
        if let Some(volatility) = indicators.volatility_20d {
            parts.push(format!("vol {volatility:.0}%"));
        }
        if !parts.is_empty() {
            line.push_str(&format!(" | {}", parts.join(" | ")));
        }
    }

    if let Some(analysis) = &stock.profit_analysis {
        if analysis.is_profitable {
            line.push_str(&format!(" | net +{:.2}%", analysis.net_profit_yield));
        } else {
            line.push_str(&format!(" | :warning: {:+.2}%", analysis.net_profit_yield));
        }
    }

    line
}

fn risk_glyph(stock: &DividendStock) -> &'static str {
    match stock.risk.as_ref().map(|r| r.risk_level) {
        Some(RiskLevel::Low) => ":large_green_circle:",
        Some(RiskLevel::Medium) => ":large_yellow_circle:",
        Some(RiskLevel::High) => ":red_circle:",
        None => ":white_circle:",
    }
}

fn build_empty_notice(result: &DividendScanResult) -> DigestBlock {
    let mut text = format!(
        ":moneybag: *Upcoming US ex-dividend dates*\n  no candidates between {} and {}.",
        result.scan_start_date, result.scan_end_date
    );
    if result.high_risk_excluded > 0 {
        text.push_str(&format!(
            "\n  ({} HIGH risk stocks were excluded)",
            result.high_risk_excluded
        ));
    }
    DigestBlock::section(TextObject::mrkdwn(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use scan_core::{
        DividendProfitAnalysis, RiskAssessment, RiskLevel, ScanFilters, TechnicalIndicators,
    };

    fn stock(ticker: &str, risk_level: RiskLevel, net_profit: f64) -> DividendStock {
        DividendStock {
            ticker: ticker.to_string(),
            company_name: format!("{ticker} Corp"),
            ex_dividend_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            dividend_yield: 5.0,
            dividend_amount: 2.0,
            last_dividend_value: 0.5,
            market_cap: 500_000_000_000,
            current_price: 100.0,
            reference_url: format!("https://finance.yahoo.com/quote/{ticker}"),
            indicators: Some(TechnicalIndicators {
                rsi_14: Some(45.6),
                volatility_20d: Some(22.4),
                ..Default::default()
            }),
            risk: Some(RiskAssessment::for_level(
                risk_level,
                vec!["all indicators within normal range".to_string()],
            )),
            profit_analysis: Some(DividendProfitAnalysis {
                gross_dividend_yield: 5.0,
                tax_rate: 15.4,
                net_dividend_yield: 4.23,
                estimated_ex_date_drop: 4.23 - net_profit,
                net_profit_yield: net_profit,
                is_profitable: net_profit > 0.0,
                verdict: String::new(),
            }),
        }
    }

    fn scan_result(stocks: Vec<DividendStock>, high_risk_excluded: usize) -> DividendScanResult {
        DividendScanResult {
            stocks,
            scanned_at: Utc::now(),
            scan_range_days: 4,
            scan_start_date: NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
            scan_end_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            filters_applied: ScanFilters::default(),
            high_risk_excluded,
        }
    }

    #[test]
    fn digest_is_one_section_with_title_and_lines() {
        let result = scan_result(
            vec![stock("JNJ", RiskLevel::Low, 1.25), stock("T", RiskLevel::Medium, 0.4)],
            0,
        );
        let blocks = format_for_slack(&result);

        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].text.as_ref().unwrap().text;
        assert!(text.contains(":moneybag:"));
        assert!(text.contains("(2 stocks)"));
        assert!(text.contains("<https://finance.yahoo.com/quote/JNJ|JNJ>"));
        assert!(text.contains("dividend 5.0%"));
        assert!(text.contains("RSI 46"));
        assert!(text.contains("vol 22%"));
    }

    #[test]
    fn risk_glyphs_map_per_tier() {
        let result = scan_result(
            vec![stock("A", RiskLevel::Low, 1.0), stock("B", RiskLevel::Medium, 1.0)],
            0,
        );
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains(":large_green_circle:"));
        assert!(text.contains(":large_yellow_circle:"));
    }

    #[test]
    fn unassessed_stock_gets_neutral_glyph() {
        let mut unassessed = stock("X", RiskLevel::Low, 1.0);
        unassessed.risk = None;
        let result = scan_result(vec![unassessed], 0);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains(":white_circle:"));
    }

    #[test]
    fn title_reports_high_risk_exclusions() {
        let result = scan_result(vec![stock("JNJ", RiskLevel::Low, 1.0)], 3);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains("3 HIGH risk excluded"));
    }

    #[test]
    fn negative_net_profit_carries_warning_marker() {
        let result = scan_result(vec![stock("KO", RiskLevel::Low, -0.54)], 0);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains(":warning: -0.54%"));
    }

    #[test]
    fn positive_net_profit_is_signed() {
        let result = scan_result(vec![stock("KO", RiskLevel::Low, 1.25)], 0);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains("net +1.25%"));
    }

    #[test]
    fn empty_result_names_the_window() {
        let result = scan_result(Vec::new(), 0);
        let blocks = format_for_slack(&result);
        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].text.as_ref().unwrap().text;
        assert!(text.contains("no candidates"));
        assert!(text.contains("2026-02-16"));
        assert!(text.contains("2026-02-20"));
        assert!(!text.contains("excluded"));
    }

    #[test]
    fn empty_result_mentions_exclusions_when_nonzero() {
        let result = scan_result(Vec::new(), 2);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains("2 HIGH risk stocks were excluded"));
    }

    #[test]
    fn missing_indicators_still_format() {
        let mut bare = stock("F", RiskLevel::Low, 0.8);
        bare.indicators = None;
        bare.profit_analysis = None;
        let result = scan_result(vec![bare], 0);
        let text = format_for_slack(&result)[0].text.as_ref().unwrap().text.clone();
        assert!(text.contains("<https://finance.yahoo.com/quote/F|F>"));
        assert!(!text.contains("RSI"));
        assert!(!text.contains("net"));
    }
}
