use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing::{info, warn, Level};

use crate::domain::roster::SectionRoster;

mod app;
mod config;

mod domain {
    pub mod entities {
        pub mod attendance;
        pub mod dataset;
        pub mod view;
    }
    pub mod errors;
    pub mod roster;
}

mod infra {
    pub mod auth {
        pub mod credentials;
    }
    pub mod import {
        pub mod csv;
        pub mod location;
        pub mod remote;
        pub mod xlsx;
    }
    pub mod memory {
        pub mod store;
    }
}

mod platform {
    pub mod desktop {
        pub mod blocking;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
    }
}

mod usecase {
    pub mod ports {
        pub mod auth;
        pub mod repo;
        pub mod source;
    }
    pub mod services {
        pub mod attendance_service;
        pub mod import_service;
        pub mod query_service;
        pub mod summary_service;
    }
    pub mod session;
}


fn main() {
    if let Err(err) = dioxus::logger::init(Level::INFO) {
        eprintln!("logger init failed: {err}");
    }

    let roster =
        SectionRoster::standard().expect("should build a section roster without duplicate rolls");
    info!(rolls = roster.len(), "section roster ready");

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Rollcall"))
                .with_data_directory(webview_data_dir),
        )
        .launch(app::App);
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "rollcall")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir()).inspect_err(|err| {
        warn!("{err:#}");
    })
}
