//! Printable HTML rendering of a [`Report`].

use crate::domain::recommendation::Priority;
use crate::report::{BreakdownEntry, Report};
use std::fmt::Write;

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 1000px; margin: 0 auto; padding: 20px; }
    h1 { color: #2563eb; border-bottom: 1px solid #e5e7eb; padding-bottom: 10px; }
    h2 { color: #4b5563; margin-top: 20px; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
    th, td { border: 1px solid #e5e7eb; padding: 8px 12px; text-align: left; }
    th { background-color: #f9fafb; }
    .metrics { display: flex; flex-wrap: wrap; gap: 20px; margin-bottom: 20px; }
    .metric { flex: 1; min-width: 200px; background-color: #f9fafb; border-radius: 8px; padding: 15px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .metric-value { font-size: 24px; font-weight: bold; color: #2563eb; }
    .metric-label { font-size: 14px; color: #6b7280; }
    .recommendation { margin-bottom: 10px; padding: 10px; border-left: 4px solid #ddd; }
    .recommendation.high { border-left-color: #ef4444; background-color: #fee2e2; }
    .recommendation.medium { border-left-color: #f59e0b; background-color: #fef3c7; }
    .recommendation.low { border-left-color: #10b981; background-color: #d1fae5; }
    @media print { body { font-size: 12pt; } .no-print { display: none; } }
"#;

pub fn render_html(report: &Report) -> String {
    let mut out = String::with_capacity(8 * 1024);
    // Writing into a String cannot fail.
    let _ = write_document(&mut out, report);
    out
}

fn write_document(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Inventory Report</title>")?;
    writeln!(out, "<style>{STYLE}</style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>Inventory Report</h1>")?;
    writeln!(
        out,
        "<p>Generated on {}</p>",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let summary = &report.summary;
    writeln!(out, "<h2>Summary</h2>")?;
    writeln!(out, "<div class=\"metrics\">")?;
    write_metric(out, &summary.total_items.to_string(), "Total Items")?;
    write_metric(out, &money(summary.total_value), "Total Value")?;
    write_metric(
        out,
        &summary.items_below_reorder_level.to_string(),
        "Items Below Reorder Level",
    )?;
    write_metric(out, &format!("{:.1}%", summary.health_score), "Inventory Health Score")?;
    writeln!(out, "</div>")?;

    writeln!(out, "<h2>Category Breakdown</h2>")?;
    write_breakdown(out, "Category", &report.category_breakdown)?;

    writeln!(out, "<h2>Supplier Breakdown</h2>")?;
    write_breakdown(out, "Supplier", &report.supplier_breakdown)?;

    writeln!(out, "<h2>Stock Health</h2>")?;
    writeln!(out, "<p>Overall Health: {:.1}%</p>", report.stock_health.overall)?;
    write_table_head(
        out,
        &["Category", "Health Score", "Items Below Reorder", "Total Items"],
    )?;
    for c in &report.stock_health.by_category {
        writeln!(
            out,
            "<tr><td>{}</td><td>{:.1}%</td><td>{}</td><td>{}</td></tr>",
            escape(&c.category),
            c.health_percentage,
            c.below_reorder_count,
            c.item_count
        )?;
    }
    write_table_tail(out)?;

    writeln!(out, "<h2>Action Items</h2>")?;
    writeln!(out, "<h3>Top Items to Restock</h3>")?;
    write_table_head(
        out,
        &["Item", "Current Stock", "Reorder Level", "Days Until Empty"],
    )?;
    for r in &report.action_items.items_to_restock {
        let days = match r.depletion.whole_days() {
            Some(d) => d.to_string(),
            None => "No sales".to_string(),
        };
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&r.item.item_name),
            r.item.current_stock,
            r.item.reorder_level,
            days
        )?;
    }
    write_table_tail(out)?;

    writeln!(out, "<h3>Slow-Moving Items</h3>")?;
    write_table_head(out, &["Item", "Current Stock", "Value", "Avg. Daily Sales"])?;
    for item in &report.action_items.slow_moving_items {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&item.item_name),
            item.current_stock,
            money(item.stock_value()),
            item.avg_daily_sales
        )?;
    }
    write_table_tail(out)?;

    writeln!(out, "<h2>Recommendations</h2>")?;
    if report.recommendations.is_empty() {
        writeln!(out, "<p>No recommendations at this time.</p>")?;
    }
    for priority in Priority::ALL {
        let group: Vec<_> = report
            .recommendations
            .iter()
            .filter(|r| r.priority == priority)
            .collect();
        if group.is_empty() {
            continue;
        }
        writeln!(out, "<h3>{} priority</h3>", priority_label(priority))?;
        for rec in group {
            writeln!(
                out,
                "<div class=\"recommendation {}\"><strong>{}</strong><p>{}</p></div>",
                priority.as_str(),
                escape(&rec.message),
                escape(&rec.detail)
            )?;
        }
    }

    writeln!(out, "<div class=\"no-print\">")?;
    writeln!(
        out,
        "<p style=\"margin-top: 30px; text-align: center;\"><button onclick=\"window.print()\">Print Report</button></p>"
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_metric(out: &mut String, value: &str, label: &str) -> std::fmt::Result {
    writeln!(
        out,
        "<div class=\"metric\"><div class=\"metric-value\">{}</div><div class=\"metric-label\">{}</div></div>",
        escape(value),
        label
    )
}

fn write_breakdown(out: &mut String, label: &str, rows: &[BreakdownEntry]) -> std::fmt::Result {
    write_table_head(out, &[label, "Items", "Value", "Percentage"])?;
    for row in rows {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
            escape(&row.name),
            row.item_count,
            money(row.value),
            row.percentage
        )?;
    }
    write_table_tail(out)
}

fn write_table_head(out: &mut String, columns: &[&str]) -> std::fmt::Result {
    writeln!(out, "<table>")?;
    write!(out, "<thead><tr>")?;
    for c in columns {
        write!(out, "<th>{c}</th>")?;
    }
    writeln!(out, "</tr></thead>")?;
    writeln!(out, "<tbody>")
}

fn write_table_tail(out: &mut String) -> std::fmt::Result {
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// `$1,234.50`
fn money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::tests::item;
    use crate::domain::recommendation::tests::rec;
    use crate::domain::recommendation::RecommendationType;
    use crate::report::{build_report_with, ReportLimits};
    use chrono::{TimeZone, Utc};

    fn report() -> Report {
        let mut low = item("1");
        low.item_name = "Bolts <M8>".to_string();
        low.current_stock = 2.0;
        low.reorder_level = 10.0;
        let mut big = item("2");
        big.category = "Paint & Stain".to_string();
        big.current_stock = 1000.0;
        big.price = 12.5;

        let recs = vec![
            rec("a", RecommendationType::Danger, Priority::High),
            rec("b", RecommendationType::Info, Priority::Low),
        ];
        build_report_with(
            &[low, big],
            &recs,
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            &ReportLimits::default(),
        )
    }

    #[test]
    fn renders_all_sections() {
        let html = render_html(&report());
        for heading in [
            "<h2>Summary</h2>",
            "<h2>Category Breakdown</h2>",
            "<h2>Supplier Breakdown</h2>",
            "<h2>Stock Health</h2>",
            "<h3>Top Items to Restock</h3>",
            "<h3>Slow-Moving Items</h3>",
            "<h2>Recommendations</h2>",
        ] {
            assert!(html.contains(heading), "missing {heading}");
        }
        assert!(html.contains("Generated on 2026-10-18 09:30:00 UTC"));
        assert!(html.contains("<th>Days Until Empty</th>"));
        assert!(html.contains("50.0%"));
    }

    #[test]
    fn groups_recommendations_by_priority_colour() {
        let html = render_html(&report());
        let high = html.find("<h3>High priority</h3>").unwrap();
        let low = html.find("<h3>Low priority</h3>").unwrap();
        assert!(high < low);
        assert!(!html.contains("<h3>Medium priority</h3>"));
        assert!(html.contains("<div class=\"recommendation high\"><strong>message a</strong>"));
    }

    #[test]
    fn escapes_user_text() {
        let html = render_html(&report());
        assert!(html.contains("Bolts &lt;M8&gt;"));
        assert!(html.contains("Paint &amp; Stain"));
        assert!(!html.contains("<M8>"));
    }

    #[test]
    fn formats_money_with_grouping() {
        assert_eq!(money(12500.0), "$12,500.00");
        assert_eq!(money(999.5), "$999.50");
        assert_eq!(money(1234567.891), "$1,234,567.89");
        assert_eq!(money(0.0), "$0.00");
    }
}
