//! Element targets for the UI flow, rendered to Playwright selector
//! strings.

/// How a step locates its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Raw CSS selector, passed through untouched.
    Css(String),
    /// Exact visible text anywhere on the page.
    Text(String),
    /// Raw XPath expression.
    XPath(String),
    /// A form control by the id its label points at.
    Field(String),
    /// A button by its visible label.
    Button(String),
    /// A section heading by its visible text.
    Heading(String),
    /// An action button inside the table row containing `row_text`,
    /// identified by the button's `title` attribute.
    RowAction { row_text: String, title: String },
}

impl Selector {
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn xpath(expression: String) -> Self {
        Self::XPath(expression)
    }

    pub fn field(id: &str) -> Self {
        Self::Field(id.to_string())
    }

    pub fn button(label: &str) -> Self {
        Self::Button(label.to_string())
    }

    pub fn heading(text: &str) -> Self {
        Self::Heading(text.to_string())
    }

    pub fn row_action(row_text: &str, title: &str) -> Self {
        Self::RowAction {
            row_text: row_text.to_string(),
            title: title.to_string(),
        }
    }

    pub fn to_playwright(&self) -> String {
        match self {
            Selector::Css(css) => css.clone(),
            Selector::Text(text) => format!("text=\"{}\"", text),
            Selector::XPath(xpath) => format!("xpath={}", xpath),
            Selector::Field(id) => format!("#{}", id),
            Selector::Button(label) => {
                format!("xpath=//button[normalize-space()=\"{}\"]", label)
            }
            Selector::Heading(text) => format!(
                "xpath=//*[self::h1 or self::h2 or self::h3][normalize-space()=\"{}\"]",
                text
            ),
            Selector::RowAction { row_text, title } => format!(
                "xpath=//tr[contains(., \"{}\")]//button[@title=\"{}\"]",
                row_text, title
            ),
        }
    }
}
