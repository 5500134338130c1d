//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (reload.js)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{RELOAD_JS, ReloadVars};
//!
//! let js = RELOAD_JS.render(&ReloadVars { ws_port: 35730 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL path the live server answers with the reload client.
    pub const RELOAD_JS_PATH: &str = "/__mend/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__MEND_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live reload client, minified by the build script.
    pub const RELOAD_JS: Template<ReloadVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/reload.min.js")));

    /// Tag to paste into pages served during development.
    pub fn script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_PATH}"></script>"#)
    }
}
