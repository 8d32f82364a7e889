//! HTML rendering for the landing page and the signup form.

use crate::flash::Flash;

/// Confirmation text shown on the landing page.
pub const LANDING_TEXT: &str = "Welcome to Support App ✅ Database setup is complete!";

/// Values echoed back into the signup form when it is redisplayed.
///
/// The password is never echoed.
#[derive(Debug, Clone, Default)]
pub struct SignupValues<'a> {
    pub username: &'a str,
    pub name: &'a str,
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn notice(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => format!(
            "<div class=\"flash flash-{}\">{}</div>\n",
            flash.level.as_str(),
            escape_html(&flash.message)
        ),
        None => String::new(),
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    )
}

/// Renders the landing page, with a pending notice above the confirmation.
pub fn landing(flash: Option<&Flash>) -> String {
    page(
        "Support App",
        &format!("{}<p>{}</p>\n", notice(flash), escape_html(LANDING_TEXT)),
    )
}

/// Renders the signup form.
pub fn signup_form(flash: Option<&Flash>, values: &SignupValues<'_>) -> String {
    let form = format!(
        concat!(
            "<h1>Sign up</h1>\n",
            "<form method=\"post\" action=\"/signup\">\n",
            "<label>Username <input type=\"text\" name=\"username\" value=\"{}\" required></label>\n",
            "<label>Password <input type=\"password\" name=\"password\" required></label>\n",
            "<label>Name <input type=\"text\" name=\"name\" value=\"{}\" required></label>\n",
            "<button type=\"submit\">Sign up</button>\n",
            "</form>\n"
        ),
        escape_html(values.username),
        escape_html(values.name)
    );
    page("Sign up", &format!("{}{}", notice(flash), form))
}
