//! Authorization URL construction.
//!
//! Authorization itself happens in the user's browser; all we do here is
//! build the URL to send them to. No network, no side effects.

use url::form_urlencoded;

/// The interactive authorization page, relative to the API host.
const AUTHORIZE_ENDPOINT: &str = "/oauth/authorize.html";

/// How the authorization dialog is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// A full page.
    #[default]
    Page,
    /// A pop-up window.
    Popup,
}

impl Display {
    pub fn as_str(self) -> &'static str {
        match self {
            Display::Page => "page",
            Display::Popup => "popup",
        }
    }
}

/// A permission category requested during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Profile,
    Vacancies,
    Resume,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Profile => "profile",
            Scope::Vacancies => "vacancies",
            Scope::Resume => "resume",
        }
    }
}

/// The scope set to request when the caller has no more specific needs.
pub const DEFAULT_SCOPES: [Scope; 3] = [Scope::Profile, Scope::Vacancies, Scope::Resume];

/// Builds the full authorization URL. The scope list travels comma-joined in
/// a single query parameter.
pub(crate) fn build_authentication_url(
    base_url: &str,
    app_id: &str,
    redirect_uri: &str,
    display: Display,
    scopes: &[Scope],
) -> String {
    let scope = scopes
        .iter()
        .map(|scope| scope.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("app_id", app_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("display", display.as_str())
        .append_pair("scope", &scope)
        .finish();
    format!("{base_url}{AUTHORIZE_ENDPOINT}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scopes_and_display() {
        let url = build_authentication_url(
            "https://api.rabota.ru",
            "42",
            "https://app.example/cb",
            Display::default(),
            &DEFAULT_SCOPES,
        );
        assert!(url.starts_with("https://api.rabota.ru/oauth/authorize.html?"));
        assert!(url.contains("app_id=42"));
        assert!(url.contains("display=page"));
        assert!(url.contains("scope=profile%2Cvacancies%2Cresume"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example%2Fcb"));
    }

    #[test]
    fn popup_display_and_narrow_scope() {
        let url = build_authentication_url(
            "https://api.rabota.ru",
            "42",
            "https://app.example/cb",
            Display::Popup,
            &[Scope::Resume],
        );
        assert!(url.contains("display=popup"));
        assert!(url.contains("scope=resume"));
    }
}
