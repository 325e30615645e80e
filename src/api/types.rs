use serde::{Deserialize, Serialize};

use crate::core::application::ApplicationRef;

/// Launch options the hub stored when the server was created.
/// Every field is optional on the wire; older servers omit most of them.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserOptions {
    #[serde(default)]
    pub jhub_app: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Older API versions sent the thumbnail under this key.
    #[serde(default, rename = "imgUrl", skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// Script or notebook the app serves, relative to the user's home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
}

impl UserOptions {
    /// Options for a new app. Blank optional fields are left out.
    pub fn for_new_app(
        display_name: &str,
        framework: &str,
        filepath: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        let owned = |v: Option<&str>| non_empty(v.map(str::to_string));
        Self {
            jhub_app: true,
            display_name: Some(display_name.to_string()),
            description: owned(description),
            framework: Some(framework.to_string()),
            filepath: owned(filepath),
            ..Default::default()
        }
    }
}

/// Body of `POST /server/{id}` when creating an app.
#[derive(Serialize, Debug)]
pub(crate) struct CreateServerBody<'a> {
    pub user_options: &'a UserOptions,
}

/// A named server as returned by `GET /server/` and `GET /server/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerRecord {
    /// The listing endpoint keys records by name; the key fills this in when absent.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub user_options: Option<UserOptions>,
}

impl ServerRecord {
    /// True if the hub launched this server as a managed app.
    pub fn is_app(&self) -> bool {
        self.user_options.as_ref().is_some_and(|o| o.jhub_app)
    }

    /// Translates the wire record into the snapshot the coordinator works on.
    pub fn to_application(&self) -> ApplicationRef {
        let options = self.user_options.clone().unwrap_or_default();

        let title = non_empty(options.display_name).unwrap_or_else(|| self.name.clone());
        let thumbnail = non_empty(options.thumbnail).or_else(|| non_empty(options.img_url));
        let ready = self.ready.or(options.ready).unwrap_or(false);

        ApplicationRef {
            id: self.name.clone(),
            title,
            description: non_empty(options.description),
            framework: options.framework.unwrap_or_default(),
            thumbnail,
            url: self.url.clone().unwrap_or_default(),
            ready,
            is_public: options.public.unwrap_or(false),
        }
    }
}

/// A launchable framework as returned by `GET /frameworks`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameworkInfo {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Error bodies are FastAPI-style (`detail`) or generic (`message`).
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        let detail = self.detail.map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        non_empty(detail).or_else(|| non_empty(self.message))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
