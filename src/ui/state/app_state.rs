use std::sync::Arc;

use dioxus::prelude::{use_signal, Signal};

use crate::config::AppConfig;
use crate::domain::roster::SectionRoster;
use crate::infra::auth::credentials::ConfiguredCredentials;
use crate::infra::memory::store::MemoryRepo;
use crate::usecase::ports::auth::Authenticator;
use crate::usecase::services::summary_service::SummaryReport;
use crate::usecase::session::DashboardSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Students,
    Attendance,
    Hod,
}

impl Screen {
    pub const NAV: [Screen; 4] = [
        Screen::Dashboard,
        Screen::Students,
        Screen::Attendance,
        Screen::Hod,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Dashboard => "Dashboard",
            Screen::Students => "Students",
            Screen::Attendance => "Attendance",
            Screen::Hod => "HOD summary",
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
pub struct AppState {
    pub session: Signal<DashboardSession>,
    pub config: Signal<AppConfig>,
    pub auth: Signal<Arc<dyn Authenticator>>,
    pub screen: Signal<Screen>,
    pub sidebar_open: Signal<bool>,
    pub username: Signal<String>,
    pub password: Signal<String>,
    pub show_password: Signal<bool>,
    pub login_error: Signal<bool>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
    pub attendance_input: Signal<String>,
    pub attendance_feedback: Signal<Vec<String>>,
    pub summary_report: Signal<Option<SummaryReport>>,
}

impl AppState {
    pub fn new(roster: &'static SectionRoster, config: AppConfig) -> Self {
        let session = use_signal(|| {
            DashboardSession::new(Arc::new(MemoryRepo::new()), roster, &config)
        });
        let auth = use_signal(|| {
            Arc::new(ConfiguredCredentials::new(&config.login)) as Arc<dyn Authenticator>
        });

        Self {
            session,
            auth,
            config: use_signal(|| config),
            screen: use_signal(|| Screen::Login),
            sidebar_open: use_signal(|| false),
            username: use_signal(String::new),
            password: use_signal(String::new),
            show_password: use_signal(|| false),
            login_error: use_signal(|| false),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
            attendance_input: use_signal(String::new),
            attendance_feedback: use_signal(Vec::<String>::new),
            summary_report: use_signal(|| None::<SummaryReport>),
        }
    }
}
