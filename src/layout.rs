//! Document layout engine.
//!
//! Turns a form snapshot plus computed totals into pages of positioned draw
//! commands. Coordinates are millimetres on an A4 page, measured from the
//! top-left corner; the PDF renderer flips them into PDF space. The engine
//! itself touches no I/O, so pagination is testable without a PDF backend.

use slug::slugify;

use crate::model::QuotationForm;
use crate::pricing::QuotationTotals;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
const MARGIN_X: f64 = 10.0;
const BOTTOM_MARGIN: f64 = 20.0;
/// Content restart position on continuation pages, just below the header.
const HEADER_RESET_Y: f64 = 35.0;
const LINE_HEIGHT: f64 = 6.0;
const ROW_HEIGHT: f64 = 7.0;
const STAMP_SIZE: f64 = 25.0;
const STAMP_X: f64 = PAGE_WIDTH - 40.0;
const CURRENCY: &str = "INR";

const PT_TO_MM: f64 = 0.352_778;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// Decorative assets referenced by the document. The renderer resolves them
/// to files; a missing asset skips the command without failing the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Stamp,
}

#[derive(Debug, Clone)]
pub enum DrawCmd {
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        style: FontStyle,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Image {
        slot: ImageSlot,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// One laid-out page, ready for the output sink.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<DrawCmd>,
}

/// Approximate rendered width of Helvetica text, used to resolve right
/// alignment at layout time. An average glyph is close to half the font
/// size; exact metrics are not worth a font stack for a business document.
fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.5 * PT_TO_MM
}

/// Greedy word wrap to a printable width. Explicit newlines in the source
/// are preserved; blank lines survive as blank lines.
fn wrap_text(text: &str, width: f64, size: f64) -> Vec<String> {
    let mut wrapped = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            wrapped.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size) > width && !current.is_empty() {
                wrapped.push(current);
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            wrapped.push(current);
        }
    }
    wrapped
}

fn dash_if_empty(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// Numbers carry their source precision: whole values print without a
/// decimal point, fractional values print as-is.
fn fmt_number(value: f64) -> String {
    format!("{value}")
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    heading: &'static str,
    x: f64,
    align: Align,
}

/// Threads the page cursor through each block. Every block checks remaining
/// vertical space before drawing and breaks to a fresh page (with the header
/// redrawn) when the block would not fit.
struct DocumentBuilder<'a> {
    form: &'a QuotationForm,
    totals: &'a QuotationTotals,
    pages: Vec<Page>,
    page: Page,
    y: f64,
}

impl<'a> DocumentBuilder<'a> {
    fn new(form: &'a QuotationForm, totals: &'a QuotationTotals) -> Self {
        let mut builder = DocumentBuilder {
            form,
            totals,
            pages: Vec::new(),
            page: Page::default(),
            y: 0.0,
        };
        builder.draw_header();
        builder
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.page);
        self.pages
    }

    /// Header block, repeated at the top of every page: logo, centred title,
    /// quotation number and date on the right, and a rule underneath.
    fn draw_header(&mut self) {
        self.page.commands.push(DrawCmd::Image {
            slot: ImageSlot::Logo,
            x: MARGIN_X,
            y: 5.0,
            width: 45.0,
            height: 18.0,
        });
        let title = "QUOTATION";
        self.page.commands.push(DrawCmd::Text {
            text: title.into(),
            x: PAGE_WIDTH / 2.0 - text_width(title, 20.0) / 2.0,
            y: 14.0,
            size: 20.0,
            style: FontStyle::Bold,
        });
        self.text_right(
            &format!("Quotation No: {}", self.form.quotation_number),
            PAGE_WIDTH - MARGIN_X,
            10.0,
            11.0,
            FontStyle::Bold,
        );
        self.text_right(
            &format!("Date: {}", self.form.quotation_date),
            PAGE_WIDTH - MARGIN_X,
            16.0,
            11.0,
            FontStyle::Bold,
        );
        self.rule(25.0);
    }

    fn break_page(&mut self) {
        let full = std::mem::take(&mut self.page);
        self.pages.push(full);
        self.draw_header();
        self.y = HEADER_RESET_Y;
    }

    /// The ensure-space check: break to a new page unless `needed` more
    /// millimetres fit above the bottom margin.
    fn ensure_space(&mut self, needed: f64) {
        if self.y + needed > PAGE_HEIGHT - BOTTOM_MARGIN {
            self.break_page();
        }
    }

    fn text(&mut self, text: &str, x: f64, y: f64, size: f64, style: FontStyle) {
        self.page.commands.push(DrawCmd::Text {
            text: text.into(),
            x,
            y,
            size,
            style,
        });
    }

    fn text_right(&mut self, text: &str, right_x: f64, y: f64, size: f64, style: FontStyle) {
        let x = right_x - text_width(text, size);
        self.text(text, x, y, size, style);
    }

    fn rule(&mut self, y: f64) {
        self.page.commands.push(DrawCmd::Line {
            x1: MARGIN_X,
            y1: y,
            x2: PAGE_WIDTH - MARGIN_X,
            y2: y,
        });
    }

    /// Company and client details side by side, then a separator rule.
    /// Always the first block under the first header, so positions are fixed.
    fn details_block(&mut self) {
        let mid = PAGE_WIDTH / 2.0;
        self.text("COMPANY DETAILS", MARGIN_X, 32.0, 13.0, FontStyle::Bold);
        self.text("CLIENT DETAILS", mid, 32.0, 13.0, FontStyle::Bold);

        let top = 38.0;
        let company = self.form.company.clone();
        let client = self.form.client.clone();
        let project_name = self.form.project.name.clone();

        let left = [
            format!("Company : {}", dash_if_empty(&company.name)),
            format!("Address : {}", dash_if_empty(&company.address)),
            format!("Email : {}", dash_if_empty(&company.email)),
            format!("Phone : {}", dash_if_empty(&company.phone)),
        ];
        let right = [
            format!("Client : {}", dash_if_empty(&client.name)),
            format!("Email : {}", dash_if_empty(&client.email)),
            format!("Phone : {}", dash_if_empty(&client.phone)),
            format!("Project : {}", dash_if_empty(&project_name)),
        ];
        for (i, line) in left.iter().enumerate() {
            self.text(line, MARGIN_X, top + LINE_HEIGHT * i as f64, 11.0, FontStyle::Regular);
        }
        for (i, line) in right.iter().enumerate() {
            self.text(line, mid, top + LINE_HEIGHT * i as f64, 11.0, FontStyle::Regular);
        }

        let end = top + 26.0;
        self.rule(end);
        self.y = end + 10.0;
    }

    fn project_block(&mut self) {
        self.ensure_space(30.0);
        self.text("PROJECT DETAILS", MARGIN_X, self.y, 11.0, FontStyle::Bold);
        self.y += 8.0;
        let category = format!("Project Category : {}", dash_if_empty(&self.form.project.category));
        let kind = format!("Project Type : {}", dash_if_empty(&self.form.project.kind));
        self.text(&category, MARGIN_X, self.y, 11.0, FontStyle::Regular);
        self.y += LINE_HEIGHT;
        self.text(&kind, MARGIN_X, self.y, 11.0, FontStyle::Regular);
        self.y += 10.0;
    }

    fn heading_row(&mut self, columns: &[Column]) {
        for col in columns {
            match col.align {
                Align::Left => self.text(col.heading, col.x, self.y, 10.0, FontStyle::Bold),
                Align::Right => {
                    self.text_right(col.heading, col.x, self.y, 10.0, FontStyle::Bold)
                }
            }
        }
        self.rule(self.y + 2.0);
        self.y += ROW_HEIGHT;
    }

    /// A cost table: bold title, bold heading row, one line per row. Rows
    /// that would cross the bottom margin move to a fresh page where both
    /// the document header and the column headings are repeated.
    fn table_block(&mut self, title: &str, columns: &[Column], rows: &[Vec<String>]) {
        self.ensure_space(20.0);
        self.text(title, MARGIN_X, self.y, 11.0, FontStyle::Bold);
        self.y += LINE_HEIGHT;
        self.heading_row(columns);

        for row in rows {
            if self.y + ROW_HEIGHT > PAGE_HEIGHT - BOTTOM_MARGIN {
                self.break_page();
                self.heading_row(columns);
            }
            for (cell, col) in row.iter().zip(columns) {
                match col.align {
                    Align::Left => self.text(cell, col.x, self.y, 10.0, FontStyle::Regular),
                    Align::Right => self.text_right(cell, col.x, self.y, 10.0, FontStyle::Regular),
                }
            }
            self.y += ROW_HEIGHT;
        }
        self.y += 10.0;
    }

    fn development_table(&mut self) {
        let columns = [
            Column { heading: "TASK", x: MARGIN_X + 2.0, align: Align::Left },
            Column { heading: "COST", x: 115.0, align: Align::Right },
            Column { heading: "HOURS", x: 140.0, align: Align::Right },
            Column { heading: "RATE", x: 165.0, align: Align::Right },
            Column { heading: "TOTAL", x: 198.0, align: Align::Right },
        ];
        let rows: Vec<Vec<String>> = self
            .form
            .development
            .iter()
            .map(|row| {
                vec![
                    row.label.clone(),
                    dash_if_empty(&row.cost).to_string(),
                    dash_if_empty(&row.hours).to_string(),
                    dash_if_empty(&row.rate).to_string(),
                    fmt_number(row.effective_cost()),
                ]
            })
            .collect();
        self.table_block("DEVELOPMENT COSTS", &columns, &rows);
    }

    fn users_table(&mut self) {
        let columns = [
            Column { heading: "USERS", x: 60.0, align: Align::Right },
            Column { heading: "PRICE", x: 130.0, align: Align::Right },
            Column { heading: "TOTAL", x: 198.0, align: Align::Right },
        ];
        let rows: Vec<Vec<String>> = self
            .form
            .users
            .iter()
            .map(|row| {
                vec![
                    dash_if_empty(&row.count).to_string(),
                    dash_if_empty(&row.price).to_string(),
                    fmt_number(row.effective_cost()),
                ]
            })
            .collect();
        self.table_block("USER PRICING", &columns, &rows);
    }

    fn additional_table(&mut self) {
        let columns = [
            Column { heading: "DESCRIPTION", x: MARGIN_X + 2.0, align: Align::Left },
            Column { heading: "COST", x: 198.0, align: Align::Right },
        ];
        let rows: Vec<Vec<String>> = self
            .form
            .additional_costs
            .iter()
            .map(|row| vec![row.label.clone(), dash_if_empty(&row.cost).to_string()])
            .collect();
        self.table_block("ADDITIONAL COSTS", &columns, &rows);
    }

    /// Subtotal, tax, and grand total, right-aligned against the margin.
    /// The subtotal keeps its source precision; tax and grand total are
    /// fixed to two decimals.
    fn totals_block(&mut self) {
        self.ensure_space(40.0);
        let right = PAGE_WIDTH - 12.0;
        let totals = *self.totals;

        let subtotal = format!("Sub-Total : {} {}", CURRENCY, fmt_number(totals.subtotal));
        self.text_right(&subtotal, right, self.y, 12.0, FontStyle::Bold);

        let tax = format!(
            "Tax ({}%) : {} {:.2}",
            fmt_number(totals.tax_rate),
            CURRENCY,
            totals.tax_amount
        );
        self.text_right(&tax, right, self.y + 8.0, 12.0, FontStyle::Bold);

        let grand = format!(
            "Total Amount : {} {:.2} {}",
            CURRENCY,
            totals.grand_total,
            totals.tax_label()
        );
        self.text_right(&grand, right, self.y + 17.0, 12.0, FontStyle::Bold);

        self.y += 28.0;
    }

    /// Payment terms on the left, stamp and signature caption on the right.
    /// The two are sized together before drawing so the pair never splits
    /// across a page break, and the stamp is clamped above the bottom edge.
    fn terms_and_signature_block(&mut self) {
        let wrap_width = STAMP_X - MARGIN_X - 15.0;
        let lines = wrap_text(&self.form.payment_terms, wrap_width, 11.0);

        let terms_height = LINE_HEIGHT * (lines.len() as f64 + 1.0) + 11.0;
        let stamp_height = STAMP_SIZE + 8.0 + 6.0;
        self.ensure_space(terms_height.max(stamp_height));

        let top = self.y;
        self.text("PAYMENT TERMS :", MARGIN_X, top, 11.0, FontStyle::Regular);
        for (i, line) in lines.iter().enumerate() {
            self.text(
                line,
                MARGIN_X,
                top + LINE_HEIGHT * (i as f64 + 1.0),
                11.0,
                FontStyle::Regular,
            );
        }

        let floor = PAGE_HEIGHT - MARGIN_X;
        let disclaimer_y = (top + LINE_HEIGHT * (lines.len() as f64 + 1.0) + 5.0).min(floor);
        self.text(
            "**Terms and conditions apply",
            MARGIN_X,
            disclaimer_y,
            9.0,
            FontStyle::Italic,
        );

        // Caption sits 8mm under the stamp; shift the stamp up if the pair
        // would cross the bottom edge.
        let mut stamp_y = top;
        if stamp_y + STAMP_SIZE + 8.0 > floor {
            stamp_y = floor - STAMP_SIZE - 8.0;
        }
        self.page.commands.push(DrawCmd::Image {
            slot: ImageSlot::Stamp,
            x: STAMP_X,
            y: stamp_y,
            width: STAMP_SIZE,
            height: STAMP_SIZE,
        });
        self.text(
            "Authorized Signature",
            STAMP_X - 10.0,
            stamp_y + STAMP_SIZE + 8.0,
            10.0,
            FontStyle::Bold,
        );
    }
}

/// Lay out the complete document. Blocks are drawn in fixed order; the
/// cursor and pagination state live in the builder, so calling this twice
/// with the same snapshot yields the same pages.
pub fn paginate(form: &QuotationForm, totals: &QuotationTotals) -> Vec<Page> {
    let mut builder = DocumentBuilder::new(form, totals);
    builder.details_block();
    builder.project_block();
    builder.development_table();
    builder.users_table();
    builder.additional_table();
    builder.totals_block();
    builder.terms_and_signature_block();
    builder.finish()
}

/// `Quotation_{client}.pdf`, slugified; falls back to the project name and
/// then to a generic stem so the artifact always has a usable filename.
pub fn artifact_name(form: &QuotationForm) -> String {
    let stem = if !form.client.name.trim().is_empty() {
        slugify(&form.client.name)
    } else if !form.project.name.trim().is_empty() {
        slugify(&form.project.name)
    } else {
        String::new()
    };
    if stem.is_empty() {
        "Quotation.pdf".to_string()
    } else {
        format!("Quotation_{stem}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdditionalCost, DevelopmentItem, UserTier};
    use crate::pricing::compute_totals;

    fn base_form() -> QuotationForm {
        QuotationForm {
            quotation_number: "QTN-20260830-1234".into(),
            quotation_date: "30/08/2026".into(),
            development: vec![DevelopmentItem {
                label: "Backend".into(),
                cost: "500".into(),
                ..Default::default()
            }],
            users: vec![UserTier {
                count: "3".into(),
                price: "100".into(),
            }],
            additional_costs: vec![AdditionalCost {
                label: "Hosting".into(),
                cost: "200".into(),
            }],
            tax_percent: "18".into(),
            payment_terms: "50% advance\n50% on delivery".into(),
            ..Default::default()
        }
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn paginate_form(form: &QuotationForm) -> Vec<Page> {
        let totals = compute_totals(form);
        paginate(form, &totals)
    }

    #[test]
    fn small_document_fits_one_page() {
        let pages = paginate_form(&base_form());
        assert_eq!(pages.len(), 1);

        let all = texts(&pages[0]);
        assert!(all.contains(&"QUOTATION"));
        assert!(all.contains(&"Quotation No: QTN-20260830-1234"));
        assert!(all.contains(&"DEVELOPMENT COSTS"));
        assert!(all.contains(&"Total Amount : INR 1180.00 (Including Tax)"));
    }

    #[test]
    fn zero_tax_uses_excluding_label() {
        let mut form = base_form();
        form.tax_percent.clear();
        let pages = paginate_form(&form);
        let all = texts(&pages[0]);
        assert!(all.contains(&"Total Amount : INR 1000.00 (Excluding Tax)"));
        assert!(all.contains(&"Tax (0%) : INR 0.00"));
    }

    #[test]
    fn long_table_breaks_once_and_repeats_header() {
        let mut form = base_form();
        form.users.clear();
        form.additional_costs.clear();
        form.development = (0..30)
            .map(|i| DevelopmentItem {
                label: format!("Task {i}"),
                cost: "10".into(),
                ..Default::default()
            })
            .collect();

        let pages = paginate_form(&form);
        assert_eq!(pages.len(), 2, "30 rows should spill onto exactly one extra page");

        // Document header and column headings are redrawn on the new page.
        let second = texts(&pages[1]);
        assert!(second.contains(&"QUOTATION"));
        assert!(second.contains(&"TASK"));
        assert!(second.contains(&"TOTAL"));

        // No row is dropped or duplicated across the break.
        for i in 0..30 {
            let label = format!("Task {i}");
            let count: usize = pages
                .iter()
                .map(|p| texts(p).iter().filter(|t| **t == label).count())
                .sum();
            assert_eq!(count, 1, "row {label} appears {count} times");
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let form = base_form();
        let first = paginate_form(&form);
        let second = paginate_form(&form);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.commands.len(), b.commands.len());
        }
    }

    #[test]
    fn stamp_never_crosses_bottom_margin() {
        // Long terms push the signature block toward the page edge.
        let mut form = base_form();
        form.payment_terms = (0..12)
            .map(|i| format!("Milestone {i}: payable within 15 days of invoice"))
            .collect::<Vec<_>>()
            .join("\n");

        for page in paginate_form(&form) {
            for cmd in &page.commands {
                if let DrawCmd::Image {
                    slot: ImageSlot::Stamp,
                    y,
                    height,
                    ..
                } = cmd
                {
                    assert!(y + height + 8.0 <= PAGE_HEIGHT - MARGIN_X + 1e-9);
                }
            }
        }
    }

    #[test]
    fn wrap_preserves_explicit_newlines() {
        let lines = wrap_text("first line\n\nsecond line", 100.0, 11.0);
        assert_eq!(lines, vec!["first line", "", "second line"]);
    }

    #[test]
    fn wrap_splits_long_lines() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap_text(text, 25.0, 11.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 11.0) <= 25.0 + text_width("eight", 11.0));
        }
        // Nothing lost in the wrap.
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn artifact_name_is_sanitized() {
        let mut form = base_form();
        form.client.name = "Acme Corp / India".into();
        assert_eq!(artifact_name(&form), "Quotation_acme-corp-india.pdf");

        form.client.name.clear();
        form.project.name = "CRM Portal".into();
        assert_eq!(artifact_name(&form), "Quotation_crm-portal.pdf");

        form.project.name.clear();
        assert_eq!(artifact_name(&form), "Quotation.pdf");
    }
}
