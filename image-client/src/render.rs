//! Markup for the UI state. Every piece of server-provided text goes through `html_escape`.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::{
    api::ImageRecord,
    error::ClientError,
    format::format_size,
    state::{ListView, StatusMessage, UiState},
};

pub const EMPTY_STATE: &str = "No images yet. Import a Google Drive folder to get started.";
pub const UNKNOWN_SOURCE: &str = "unknown";
pub const MISSING_ID: &str = "N/A";

pub fn render_page(state: &UiState) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        "<button id=\"import-button\"{}>{}</button>\n",
        if state.import.enabled { "" } else { " disabled" },
        state.import.label
    ));
    if let Some(message) = &state.message {
        html.push_str(&render_message(message));
    }
    html.push_str(&render_list(&state.list, &state.api_url));

    html
}

pub fn render_message(message: &StatusMessage) -> String {
    format!(
        "<div class=\"status-message {}\" role=\"status\">{}</div>\n",
        message.kind.css_class(),
        text(&message.text)
    )
}

pub fn render_list(view: &ListView, api_url: &str) -> String {
    match view {
        ListView::NotLoaded => String::new(),
        ListView::Loading => "<div class=\"loading\">Loading images...</div>\n".to_owned(),
        ListView::Empty => format!("<div class=\"empty-state\">{EMPTY_STATE}</div>\n"),
        ListView::Images(records) => {
            let mut html = String::from("<div class=\"image-grid\">\n");
            for record in records {
                html.push_str(&render_card(record));
            }
            html.push_str("</div>\n");
            html
        }
        ListView::Failed(error) => render_diagnostic(error, api_url),
    }
}

pub fn render_card(record: &ImageRecord) -> String {
    let size = format_size(record.size.unwrap_or(0));
    let source = record
        .source
        .as_deref()
        .filter(|source| !source.is_empty())
        .unwrap_or(UNKNOWN_SOURCE);
    let id = record
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| MISSING_ID.to_owned());

    format!(
        concat!(
            "<div class=\"image-card\">\n",
            "  <img src=\"{url}\" alt=\"{alt}\" loading=\"lazy\">\n",
            "  <div class=\"image-info\">\n",
            "    <h3 class=\"image-name\">{name}</h3>\n",
            "    <p class=\"image-size\">Size: {size}</p>\n",
            "    <p class=\"image-source\">Source: {source}</p>\n",
            "    <p class=\"image-id\">ID: {id}</p>\n",
            "  </div>\n",
            "</div>\n",
        ),
        url = attr(&record.storage_url),
        alt = attr(&record.name),
        name = text(&record.name),
        size = size,
        source = text(source),
        id = text(&id),
    )
}

/// Title and remediation hints for a failed load.
fn diagnosis(error: &ClientError, api_url: &str) -> (&'static str, Vec<String>) {
    match error {
        ClientError::Unreachable(_) => (
            "Cannot connect to the image service",
            vec![
                format!("Make sure the backend is running at {api_url}"),
                format!("Open {api_url}/ in a browser and check that it answers"),
                "If this page is served from another origin, check that the backend allows it (CORS)"
                    .to_owned(),
            ],
        ),
        ClientError::ServerRejected { status, .. } => (
            "The server could not load images",
            vec![format!(
                "The backend answered with status {status}; its logs should say why"
            )],
        ),
        ClientError::MalformedResponse(_) => (
            "The server sent an unexpected response",
            vec![
                "A proxy or misconfigured backend may be returning a page instead of data"
                    .to_owned(),
                format!("Check that {api_url} points at the API and not at a web frontend"),
            ],
        ),
        ClientError::InvalidInput(_) => ("Invalid input", Vec::new()),
    }
}

pub fn render_diagnostic(error: &ClientError, api_url: &str) -> String {
    let (title, hints) = diagnosis(error, api_url);

    let mut html = format!(
        "<div class=\"diagnostic\" data-kind=\"{}\">\n  <h3>{}</h3>\n  <p>{}</p>\n",
        error.kind(),
        title,
        text(&error.to_string())
    );
    if !hints.is_empty() {
        html.push_str("  <ul>\n");
        for hint in &hints {
            html.push_str(&format!("    <li>{}</li>\n", text(hint)));
        }
        html.push_str("  </ul>\n");
    }
    html.push_str("  <button class=\"retry\" data-action=\"retry\">Retry</button>\n</div>\n");

    html
}

#[cfg(test)]
mod test {
    use super::{render_card, render_diagnostic, render_list, render_page, EMPTY_STATE};
    use crate::{
        api::{ImageId, ImageRecord},
        error::ClientError,
        state::{ListView, MessageKind, UiState},
    };

    const API: &str = "http://localhost:8000";

    fn record(id: Option<i64>, name: &str, size: Option<u64>, source: Option<&str>) -> ImageRecord {
        ImageRecord {
            id: id.map(ImageId::Number),
            name: name.to_owned(),
            storage_url: format!("https://example.com/{name}"),
            size,
            source: source.map(str::to_owned),
        }
    }

    #[test]
    pub fn card_shows_all_fields() {
        let html = render_card(&record(Some(42), "cat.jpg", Some(1536), Some("google_drive")));
        assert!(html.contains("<h3 class=\"image-name\">cat.jpg</h3>"));
        assert!(html.contains("Size: 1.5 KB"));
        assert!(html.contains("Source: google_drive"));
        assert!(html.contains("ID: 42"));
        assert!(html.contains("src=\"https://example.com/cat.jpg\""));
    }

    #[test]
    pub fn card_defaults() {
        let html = render_card(&record(None, "x.png", None, None));
        assert!(html.contains("Source: unknown"));
        assert!(html.contains("ID: N/A"));
        assert!(html.contains("Size: 0 Bytes"));
    }

    #[test]
    pub fn server_text_is_escaped() {
        let mut evil = record(Some(1), "<script>alert(1)</script>", None, Some("<b>x</b>"));
        evil.storage_url = "https://x/\" onerror=\"alert(1)".to_owned();
        let html = render_card(&evil);
        assert!(html.contains(
            "<h3 class=\"image-name\">&lt;script&gt;alert(1)&lt;/script&gt;</h3>"
        ));
        assert!(html.contains("Source: &lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("\" onerror=\""));

        let diagnostic = render_diagnostic(
            &ClientError::ServerRejected {
                status: 500,
                detail: Some("<img src=x onerror=alert(1)>".to_owned()),
            },
            API,
        );
        assert!(!diagnostic.contains("<img"));
    }

    #[test]
    pub fn empty_and_populated_lists() {
        let empty = render_list(&ListView::Empty, API);
        assert!(empty.contains(EMPTY_STATE));
        assert_eq!(empty.matches("class=\"image-card\"").count(), 0);

        let records = vec![
            record(Some(1), "a.jpg", Some(10), None),
            record(Some(2), "b.jpg", Some(20), None),
            record(None, "c.jpg", None, Some("test")),
        ];
        let html = render_list(&ListView::Images(records), API);
        assert_eq!(html.matches("class=\"image-card\"").count(), 3);
        assert!(!html.contains(EMPTY_STATE));
    }

    #[test]
    pub fn diagnostics_offer_retry() {
        for error in [
            ClientError::Unreachable("connection refused".to_owned()),
            ClientError::MalformedResponse("expected JSON but got text/html".to_owned()),
            ClientError::ServerRejected {
                status: 503,
                detail: None,
            },
        ] {
            let html = render_diagnostic(&error, API);
            assert!(html.contains("data-action=\"retry\""));
            assert!(html.contains(&format!("data-kind=\"{}\"", error.kind())));
        }

        let html = render_diagnostic(&ClientError::Unreachable("refused".to_owned()), API);
        assert!(html.contains("http://localhost:8000"));
    }

    #[test]
    pub fn page_reflects_import_control_and_message() {
        let mut state = UiState::new(API);
        state.begin_import();
        state.show_message(MessageKind::Info, "Starting import...");
        let html = render_page(&state);
        assert!(html.contains("<button id=\"import-button\" disabled>Importing...</button>"));
        assert!(html.contains("status-message info"));

        state.end_import();
        let html = render_page(&state);
        assert!(html.contains("<button id=\"import-button\">Import Images</button>"));
    }
}
