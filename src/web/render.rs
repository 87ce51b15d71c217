//! Server-side HTML rendering.
//!
//! Every page shares one layout: a top navigation bar for the four sections
//! and a left-hand menu listing the configured forms. All interpolated text
//! goes through [`escape`].

use libreforms_common::{FieldSpec, FormDefinition, InputKind, ValidationErrors, ValueKind};

use crate::views::Table;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Forms,
    Tables,
    Dashboards,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Forms => "forms",
            Self::Tables => "tables",
            Self::Dashboards => "dashboards",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Forms => "Forms",
            Self::Tables => "Tables",
            Self::Dashboards => "Dashboards",
        }
    }

    /// URL of the section index; entries live below it.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Forms => "/forms/",
            Self::Tables => "/tables/",
            Self::Dashboards => "/dashboards/",
        }
    }
}

const NAV: [Section; 4] = [
    Section::Home,
    Section::Forms,
    Section::Tables,
    Section::Dashboards,
];

/// What every page needs for its chrome.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub site_name: &'a str,
    pub title: &'a str,
    pub section: Section,
    pub menu: &'a [String],
}

/// Percent-encode a query-string value (`application/x-www-form-urlencoded`).
fn query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(page: &Page<'_>, head_extra: &str, body: &str) -> String {
    let mut nav = String::new();
    for section in NAV {
        let class = if section == page.section { " class=\"active\"" } else { "" };
        nav.push_str(&format!(
            "<a href=\"{}\"{}>{}</a>",
            section.path(),
            class,
            section.title()
        ));
    }

    let mut menu = String::new();
    if page.section != Section::Home {
        menu.push_str("<aside class=\"menu\"><ul>");
        for name in page.menu {
            let class = if name == page.title { " class=\"active\"" } else { "" };
            menu.push_str(&format!(
                "<li><a href=\"{}{}\"{}>{}</a></li>",
                page.section.path(),
                escape(name),
                class,
                escape(name)
            ));
        }
        menu.push_str("</ul></aside>");
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} - {site}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n{head_extra}</head>\n\
         <body data-section=\"{section}\">\n\
         <header><span class=\"brand\">{site}</span><nav>{nav}</nav></header>\n\
         <div class=\"container\">{menu}<main>\n<h1>{title}</h1>\n{body}\n</main></div>\n\
         </body>\n</html>\n",
        title = escape(page.title),
        site = escape(page.site_name),
        section = page.section.as_str(),
    )
}

/// Home and section index pages.
pub fn index_page(page: &Page<'_>, message: &str) -> String {
    let body = format!("<p class=\"lead\">{}</p>", escape(message));
    layout(page, "", &body)
}

pub fn not_found_page(page: &Page<'_>, message: &str) -> String {
    let body = format!(
        "<div class=\"notice error\"><p>{}</p></div>",
        escape(message)
    );
    layout(page, "", &body)
}

/// State of a form page beyond the definition itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormView<'a> {
    /// Values to re-populate after a rejected submission.
    pub submitted: Option<&'a [(String, String)]>,
    pub errors: Option<&'a ValidationErrors>,
    /// Confirmation text after a successful submission.
    pub notice: Option<&'a str>,
    /// False after a submission when repeats are not allowed.
    pub show_form: bool,
}

pub fn form_page(page: &Page<'_>, form: &FormDefinition, view: &FormView<'_>) -> String {
    let mut body = String::new();
    let options = form.options();

    if let Some(notice) = view.notice {
        body.push_str(&format!(
            "<div class=\"notice success\"><p>Submitted:</p><pre>{}</pre></div>",
            escape(notice)
        ));
    }

    if let Some(errors) = view.errors {
        body.push_str("<div class=\"notice error\"><p>The submission was not saved.</p><ul>");
        for (field, messages) in errors.iter() {
            for message in messages {
                body.push_str(&format!(
                    "<li><strong>{}</strong>: {}</li>",
                    escape(&field.replace('_', " ")),
                    escape(message)
                ));
            }
        }
        body.push_str("</ul></div>");
    }

    if !view.show_form {
        body.push_str(&format!(
            "<p><a href=\"/forms/{}\">Back to the form</a></p>",
            escape(&form.name)
        ));
        return layout(page, "", &body);
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"/forms/{}\" class=\"entry\">",
        escape(&form.name)
    ));
    for field in form.fields() {
        let field_errors = view.errors.and_then(|e| e.get(&field.name));
        body.push_str(&render_field(
            field,
            view.submitted,
            options.suppress_default_values,
            field_errors,
        ));
    }
    body.push_str("<button type=\"submit\">Submit</button></form>");

    let mut links = Vec::new();
    if options.allow_csv_templates {
        links.push(format!(
            "<a href=\"/forms/{}/template.csv\">Download CSV template</a>",
            escape(&form.name)
        ));
    }
    if options.allow_uploads {
        links.push(format!(
            "Bulk upload: <code>POST /forms/{}/upload</code> with a CSV body",
            escape(&form.name)
        ));
    }
    if !links.is_empty() {
        body.push_str(&format!("<p class=\"extras\">{}</p>", links.join(" &middot; ")));
    }

    layout(page, "", &body)
}

fn render_field(
    field: &FieldSpec,
    submitted: Option<&[(String, String)]>,
    suppress_defaults: bool,
    errors: Option<&[String]>,
) -> String {
    let name = escape(&field.name);
    let label = escape(&field.label());
    let required = if field.output.required { " required" } else { "" };

    let values: Vec<&str> = match submitted {
        Some(pairs) => pairs
            .iter()
            .filter(|(k, _)| k == &field.name)
            .map(|(_, v)| v.as_str())
            .collect(),
        None if suppress_defaults => Vec::new(),
        None => field.default_value().into_iter().collect(),
    };
    let current = values.last().copied().unwrap_or_default();

    let widget = match field.input.kind {
        InputKind::Textarea => format!(
            "<textarea id=\"{name}\" name=\"{name}\"{required}>{}</textarea>",
            escape(current)
        ),
        InputKind::Radio | InputKind::Checkbox => {
            let kind = field.input.kind.as_str();
            let mut out = String::from("<span class=\"choices\">");
            for option in &field.input.content {
                let checked = if values.contains(&option.as_str()) { " checked" } else { "" };
                // HTML `required` on checkboxes would demand every box.
                let required = if field.input.kind == InputKind::Radio { required } else { "" };
                out.push_str(&format!(
                    "<label><input type=\"{kind}\" name=\"{name}\" value=\"{}\"{checked}{required}> {}</label>",
                    escape(option),
                    escape(option)
                ));
            }
            out.push_str("</span>");
            out
        }
        InputKind::Select => {
            let multiple = if ValueKind::from_tag(&field.output.type_tag) == ValueKind::List {
                " multiple"
            } else {
                ""
            };
            let mut out = format!("<select id=\"{name}\" name=\"{name}\"{multiple}{required}>");
            for option in &field.input.content {
                let selected = if values.contains(&option.as_str()) { " selected" } else { "" };
                out.push_str(&format!(
                    "<option value=\"{}\"{selected}>{}</option>",
                    escape(option),
                    escape(option)
                ));
            }
            out.push_str("</select>");
            out
        }
        InputKind::Number => {
            let step = if ValueKind::from_tag(&field.output.type_tag) == ValueKind::Int {
                "1"
            } else {
                "any"
            };
            format!(
                "<input type=\"number\" step=\"{step}\" id=\"{name}\" name=\"{name}\" value=\"{}\"{required}>",
                escape(current)
            )
        }
        InputKind::Text | InputKind::Date | InputKind::Hidden => format!(
            "<input type=\"{}\" id=\"{name}\" name=\"{name}\" value=\"{}\"{required}>",
            field.input.kind.as_str(),
            escape(current)
        ),
    };

    if field.input.kind == InputKind::Hidden {
        return widget;
    }

    let mut out = format!("<div class=\"field\"><label for=\"{name}\">{label}</label>{widget}");
    if let Some(description) = &field.description {
        out.push_str(&format!("<small>{}</small>", escape(description)));
    }
    for message in errors.unwrap_or_default() {
        out.push_str(&format!("<span class=\"field-error\">{}</span>", escape(message)));
    }
    out.push_str("</div>");
    out
}

pub fn table_page(page: &Page<'_>, table: &Table) -> String {
    let mut body = String::from("<table class=\"data\"><thead><tr>");
    for column in &table.columns {
        body.push_str(&format!("<th>{}</th>", escape(column)));
    }
    body.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        body.push_str("<tr>");
        for cell in row {
            body.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        body.push_str("</tr>");
    }
    body.push_str("</tbody></table>");
    if table.rows.is_empty() {
        body.push_str("<p class=\"empty\">No submissions yet.</p>");
    }
    layout(page, "", &body)
}

/// Chart page. `figure_json` is embedded as a JSON data block and drawn by
/// `/static/dashboard.js`; `y_choices` become links that set `?y=`.
pub fn dashboard_page(page: &Page<'_>, figure_json: &str, y: &str, y_choices: &[String]) -> String {
    let head = format!(
        "<script src=\"{}\" defer></script>\n<script src=\"/static/dashboard.js\" defer></script>\n",
        PLOTLY_CDN
    );

    let mut body = String::new();
    if !y_choices.is_empty() {
        body.push_str("<p class=\"y-select\">Plot: ");
        let links: Vec<String> = y_choices
            .iter()
            .map(|choice| {
                if choice == y {
                    format!("<strong>{}</strong>", escape(&choice.replace('_', " ")))
                } else {
                    format!(
                        "<a href=\"/dashboards/{}?y={}\">{}</a>",
                        escape(page.title),
                        escape(&query_value(choice)),
                        escape(&choice.replace('_', " "))
                    )
                }
            })
            .collect();
        body.push_str(&links.join(" | "));
        body.push_str("</p>");
    }
    body.push_str("<div id=\"chart\" class=\"chart\"></div>");
    body.push_str(&format!(
        "<script type=\"application/json\" id=\"figure\">{}</script>",
        figure_json.replace("</", "<\\/")
    ));
    layout(page, &head, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libreforms_common::FormCatalog;

    const FORMS: &str = r#"
intake:
  Full_Name:
    input_field: { type: text, content: [Jane] }
    output_data: { type: str, required: true }
    description: As on your ID
  Color:
    input_field: { type: radio, content: [red, blue] }
    output_data: { type: str }
  Tags:
    input_field: { type: checkbox, content: [a, b] }
    output_data: { type: list }
  Count:
    input_field: { type: number }
    output_data: { type: int }
  _allow_csv_templates: true
quiet:
  Name:
    input_field: { type: text, content: [Jane] }
    output_data: { type: str }
  _suppress_default_values: true
"#;

    fn menu() -> Vec<String> {
        vec!["intake".to_string(), "quiet".to_string()]
    }

    fn page<'a>(title: &'a str, section: Section, menu: &'a [String]) -> Page<'a> {
        Page {
            site_name: "libreForms",
            title,
            section,
            menu,
        }
    }

    #[test]
    fn escape_covers_html_specials() {
        assert_eq!(
            escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn layout_marks_active_section_and_menu() {
        let menu = menu();
        let html = index_page(&page("Form", Section::Forms, &menu), "Select a form");
        assert!(html.contains("<a href=\"/forms/\" class=\"active\">Forms</a>"));
        assert!(html.contains("href=\"/forms/intake\""));
        assert!(html.contains("Select a form"));
    }

    #[test]
    fn home_page_has_no_side_menu() {
        let menu = menu();
        let html = index_page(&page("libreForms", Section::Home, &menu), "Welcome");
        assert!(!html.contains("class=\"menu\""));
    }

    #[test]
    fn form_page_renders_widgets_and_defaults() {
        let catalog = FormCatalog::parse(FORMS).unwrap();
        let menu = menu();
        let view = FormView {
            show_form: true,
            ..FormView::default()
        };
        let html = form_page(
            &page("intake", Section::Forms, &menu),
            catalog.get("intake").unwrap(),
            &view,
        );
        assert!(html.contains("<label for=\"Full_Name\">Full Name</label>"));
        assert!(html.contains("name=\"Full_Name\" value=\"Jane\" required"));
        assert!(html.contains("<small>As on your ID</small>"));
        assert!(html.contains("type=\"radio\" name=\"Color\" value=\"red\" checked"));
        assert!(html.contains("type=\"checkbox\" name=\"Tags\" value=\"a\">"));
        assert!(html.contains("step=\"1\""));
        assert!(html.contains("/forms/intake/template.csv"));
    }

    #[test]
    fn form_page_suppresses_defaults() {
        let catalog = FormCatalog::parse(FORMS).unwrap();
        let menu = menu();
        let view = FormView {
            show_form: true,
            ..FormView::default()
        };
        let html = form_page(
            &page("quiet", Section::Forms, &menu),
            catalog.get("quiet").unwrap(),
            &view,
        );
        assert!(html.contains("name=\"Name\" value=\"\""));
    }

    #[test]
    fn form_page_shows_errors_and_resubmitted_values() {
        let catalog = FormCatalog::parse(FORMS).unwrap();
        let menu = menu();
        let submitted = vec![
            ("Count".to_string(), "lots".to_string()),
            ("Tags".to_string(), "b".to_string()),
        ];
        let mut errors = ValidationErrors::new();
        errors.add("Full_Name", "Missing data for required field.");
        let view = FormView {
            submitted: Some(submitted.as_slice()),
            errors: Some(&errors),
            notice: None,
            show_form: true,
        };
        let html = form_page(
            &page("intake", Section::Forms, &menu),
            catalog.get("intake").unwrap(),
            &view,
        );
        assert!(html.contains("The submission was not saved."));
        assert!(html.contains("<strong>Full Name</strong>: Missing data for required field."));
        assert!(html.contains("value=\"lots\""));
        assert!(html.contains("value=\"b\" checked"));
        assert!(html.contains("name=\"Full_Name\" value=\"\" required"));
    }

    #[test]
    fn confirmation_without_form_links_back() {
        let catalog = FormCatalog::parse(FORMS).unwrap();
        let menu = menu();
        let view = FormView {
            notice: Some("{\"Full_Name\":\"<b>\"}"),
            show_form: false,
            ..FormView::default()
        };
        let html = form_page(
            &page("intake", Section::Forms, &menu),
            catalog.get("intake").unwrap(),
            &view,
        );
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("Back to the form"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn table_page_escapes_cells() {
        let menu = menu();
        let table = Table {
            columns: vec!["Name".into()],
            rows: vec![vec!["<script>".into()]],
        };
        let html = table_page(&page("intake", Section::Tables, &menu), &table);
        assert!(html.contains("<th>Name</th>"));
        assert!(html.contains("<td>&lt;script&gt;</td>"));
        assert!(!html.contains("No submissions yet."));
    }

    #[test]
    fn dashboard_page_embeds_figure_safely() {
        let menu = menu();
        let html = dashboard_page(
            &page("intake", Section::Dashboards, &menu),
            "{\"name\":\"</script>\"}",
            "Count",
            &["Count".to_string(), "Weight".to_string()],
        );
        assert!(html.contains("<\\/script>"));
        assert!(html.contains("<strong>Count</strong>"));
        assert!(html.contains("href=\"/dashboards/intake?y=Weight\""));
        assert!(html.contains("plotly"));
    }

    #[test]
    fn dashboard_links_percent_encode_field_names() {
        let menu = menu();
        let html = dashboard_page(
            &page("intake", Section::Dashboards, &menu),
            "{}",
            "Count",
            &["Count".to_string(), "R&D #1".to_string()],
        );
        assert!(html.contains("href=\"/dashboards/intake?y=R%26D+%231\""));
        assert!(html.contains(">R&amp;D #1</a>"));
    }
}
