use coin_model::CoinId;
use std::fmt::Write;

use crate::dashboard::{DashboardView, Selection};

const STYLE: &str = "body{font-family:Roboto,sans-serif;max-width:1040px;margin:2em auto;padding:0 1em}\
form{display:flex;flex-wrap:wrap;gap:1em;align-items:end}\
label{display:flex;flex-direction:column;font-weight:bold}\
input,select{border-radius:10px;padding:.4em;background:#f1f1f1;border:1px solid #ccc}\
button{background:#4caf50;color:#fff;border:0;border-radius:10px;padding:.5em 1.2em}\
.error{color:#b00020}.up{color:#2e7d32}.down{color:#c62828}";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn coin_options(out: &mut String, selected: Option<CoinId>, allow_none: bool) {
    if allow_none {
        let marker = if selected.is_none() { " selected" } else { "" };
        let _ = write!(out, "<option value=\"none\"{}>none</option>", marker);
    }
    for coin in CoinId::ALL {
        let marker = if selected == Some(coin) { " selected" } else { "" };
        let _ = write!(out, "<option value=\"{0}\"{1}>{0}</option>", coin, marker);
    }
}

fn quantity_value(selection: &Selection, slot: usize) -> String {
    match selection.holdings.get(slot) {
        Some(holding) if holding.quantity > 0.0 => holding.quantity.to_string(),
        _ => String::new(),
    }
}

fn render_form(out: &mut String, selection: &Selection) {
    out.push_str("<form method=\"get\" action=\"/\">");

    out.push_str("<label>First cryptocurrency<select name=\"coin1\">");
    coin_options(out, selection.holdings.first().map(|h| h.coin), false);
    out.push_str("</select></label>");

    out.push_str("<label>Second cryptocurrency<select name=\"coin2\">");
    coin_options(out, selection.holdings.get(1).map(|h| h.coin), true);
    out.push_str("</select></label>");

    for (slot, name) in ["qty1", "qty2"].into_iter().enumerate() {
        let _ = write!(
            out,
            "<label>Quantity {}<input type=\"number\" name=\"{}\" min=\"0\" step=\"0.1\" value=\"{}\"></label>",
            slot + 1,
            name,
            quantity_value(selection, slot)
        );
    }

    out.push_str("<button type=\"submit\">Update</button></form>");
}

/// Renders the full page. `chart_svg` is inlined as is.
pub fn render_page(view: &DashboardView, selection: &Selection, chart_svg: Option<&str>) -> String {
    let mut out = String::with_capacity(16 * 1024);
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Cryptocurrency Price Tracker</title><style>{}</style></head><body>\
         <h1>🚀 Cryptocurrency Price Tracker</h1>",
        STYLE
    );

    render_form(&mut out, selection);

    for message in &view.errors {
        let _ = write!(out, "<p class=\"error\">{}</p>", escape(message));
    }

    if let Some(title) = &view.title {
        let _ = write!(out, "<h2>💰 {}</h2>", escape(title));
    }

    if !view.summaries.is_empty() {
        out.push_str("<h3>Market Summary</h3>");
        for summary in &view.summaries {
            let trend = if summary.change_24h.starts_with('-') {
                "down"
            } else {
                "up"
            };
            let _ = write!(
                out,
                "<section><p><strong>{} ({})</strong></p><p><strong>{}</strong></p>\
                 <p class=\"{}\"><strong>{}</strong> today</p><p>Market cap: {}</p></section>",
                escape(&summary.name),
                escape(&summary.symbol),
                summary.price_eur,
                trend,
                summary.change_24h,
                summary.market_cap_eur
            );
        }
    }

    if let Some(svg) = chart_svg {
        let _ = write!(out, "<figure>{}</figure>", svg);
    }

    if let Some(portfolio) = &view.portfolio {
        out.push_str("<h3>🧮 Portfolio Tracker</h3>");
        for entry in portfolio {
            let _ = write!(
                out,
                "<section><p><strong>Your Portfolio Value for {0}</strong></p>\
                 <p><strong>{1} {0}</strong> is worth: {2} ({3})</p>\
                 <p>24h change: {4}</p></section>",
                escape(&entry.name),
                entry.quantity,
                entry.value_eur,
                entry.value_usd,
                entry.delta_24h_eur
            );
        }
    }

    out.push_str("</body></html>");
    out
}
