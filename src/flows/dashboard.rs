//! Dashboard shell content: navigation, overview cards and the user menu.

use crate::{
    auth::{AuthBackend, User},
    session::{Navigator, Route},
};
use tracing::{error, info};

#[derive(Debug)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

impl NavItem {
    /// Path segment after `/dashboard/`; `None` for the overview.
    #[must_use]
    pub fn section(&self) -> Option<&'static str> {
        self.href
            .strip_prefix("/dashboard/")
            .filter(|section| !section.is_empty())
    }
}

pub static NAVIGATION: [NavItem; 7] = [
    NavItem {
        name: "Visão Geral",
        href: "/dashboard",
    },
    NavItem {
        name: "Conversas",
        href: "/dashboard/conversations",
    },
    NavItem {
        name: "Clientes",
        href: "/dashboard/customers",
    },
    NavItem {
        name: "Configurações do Bot",
        href: "/dashboard/bot-settings",
    },
    NavItem {
        name: "Integrações",
        href: "/dashboard/integrations",
    },
    NavItem {
        name: "Cobrança",
        href: "/dashboard/billing",
    },
    NavItem {
        name: "Configurações",
        href: "/dashboard/settings",
    },
];

#[must_use]
pub fn find_section(section: &str) -> Option<&'static NavItem> {
    NAVIGATION.iter().find(|item| item.section() == Some(section))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug)]
pub struct StatCard {
    pub name: &'static str,
    pub value: &'static str,
    pub change: &'static str,
    pub trend: Trend,
}

pub static OVERVIEW_STATS: [StatCard; 3] = [
    StatCard {
        name: "Conversas Totais",
        value: "2,345",
        change: "+4.75%",
        trend: Trend::Up,
    },
    StatCard {
        name: "Clientes Ativos",
        value: "573",
        change: "+2.02%",
        trend: Trend::Up,
    },
    StatCard {
        name: "Taxa de Resolução",
        value: "89.9%",
        change: "-0.44%",
        trend: Trend::Down,
    },
];

pub const OVERVIEW_TITLE: &str = "Visão Geral";
pub const OVERVIEW_SUBTITLE: &str =
    "Acompanhe o desempenho do seu bot e gerencie suas configurações.";
pub const RECENT_ACTIVITY_TITLE: &str = "Atividade Recente";
pub const RECENT_ACTIVITY: (&str, &str) = ("Nova conversa iniciada", "há 2 minutos");
pub const RECENT_ACTIVITY_ROWS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserMenu {
    pub initial: String,
    pub email: String,
    pub business_name: Option<String>,
    pub whatsapp_number: Option<String>,
}

impl UserMenu {
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        let metadata = &user.user_metadata;
        let non_empty = |value: &Option<String>| value.clone().filter(|value| !value.is_empty());
        let business_name = non_empty(&metadata.business_name);

        let initial = business_name
            .as_deref()
            .and_then(|name| name.chars().next())
            .or_else(|| user.email().chars().next())
            .map_or_else(|| "?".to_string(), |c| c.to_uppercase().to_string());

        Self {
            initial,
            email: user.email().to_string(),
            business_name,
            whatsapp_number: non_empty(&metadata.whatsapp_number),
        }
    }
}

/// Sign out and go to the login page. A failed sign-out is logged and ignored.
pub async fn logout(backend: &dyn AuthBackend, navigator: &dyn Navigator) {
    match backend.sign_out().await {
        Ok(()) => info!("signed out"),
        Err(err) => error!("Error logging out: {err}"),
    }
    navigator.push(Route::Login);
    navigator.refresh();
}
