//! Server-rendered HTML.
//!
//! Pages are plain strings built with `format!`; every piece of visitor or
//! backend supplied text goes through [`escape`].

use crate::{
    flows::{
        ConfirmState, LoginPresentation, OnboardingTour, SignupWizard, UserMenu,
        dashboard::{
            NAVIGATION, NavItem, OVERVIEW_STATS, OVERVIEW_SUBTITLE, OVERVIEW_TITLE,
            RECENT_ACTIVITY, RECENT_ACTIVITY_ROWS, RECENT_ACTIVITY_TITLE, Trend,
        },
        login::LoginState,
        onboarding::{SHORTCUT_PROMPT, TOUR_STEPS},
        wizard::FieldKind,
    },
    locale::{self, labels},
};
use std::fmt::Write;

const LANDING_NAVIGATION: [(&str, &str); 4] = [
    ("Recursos", "#features"),
    ("Preços", "#pricing"),
    ("Sobre", "#about"),
    ("Blog", "/blog"),
];

#[must_use]
pub fn escape(text: &str) -> String {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="description" content="{description}">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        lang = locale::LANG,
        description = escape(locale::SITE_DESCRIPTION),
        title = escape(title),
    )
}

fn logo(href: &str) -> String {
    format!(r#"<a class="logo" href="{href}">{}</a>"#, locale::SITE_TITLE)
}

fn error_alert(error: Option<&str>) -> String {
    error.map_or_else(String::new, |error| {
        format!(r#"<p class="error" role="alert">{}</p>"#, escape(error))
    })
}

fn login_form(state: &LoginState, presentation: LoginPresentation) -> String {
    let (presentation, id) = match presentation {
        LoginPresentation::Page => ("page", "login"),
        LoginPresentation::Popover => ("popover", "login-popover"),
    };
    let submit = if state.is_loading {
        labels::LOGIN_PENDING
    } else {
        labels::LOGIN_SUBMIT
    };

    format!(
        r#"<form id="{id}" method="post" action="/login">
<input type="hidden" name="presentation" value="{presentation}">
{error}
<label for="{id}-email">{email_label}</label>
<input id="{id}-email" type="email" name="email" placeholder="{placeholder}" value="{email}" required>
<label for="{id}-password">{password_label}</label>
<input id="{id}-password" type="password" name="password" required>
<button type="submit"{disabled}>{submit}</button>
</form>"#,
        error = error_alert(state.error.as_deref()),
        email_label = labels::EMAIL,
        placeholder = labels::EMAIL_PLACEHOLDER,
        email = escape(&state.email),
        password_label = labels::PASSWORD,
        disabled = if state.is_loading { " disabled" } else { "" },
    )
}

fn site_header(popover: Option<&LoginState>) -> String {
    let mut links = String::new();
    for (name, href) in LANDING_NAVIGATION {
        let _ = write!(links, r#"<a href="{href}">{name}</a>"#);
    }

    let state = popover.cloned().unwrap_or_default();
    let open = if popover.is_some() { " open" } else { "" };

    format!(
        r#"<header>
<nav aria-label="Global">
{logo}
<div class="links">{links}</div>
<div class="actions">
<details class="login-popover"{open}>
<summary>{login}</summary>
{form}
</details>
<a class="cta" href="/signup">{get_started}</a>
</div>
</nav>
</header>"#,
        logo = logo("/"),
        login = labels::HEADER_LOGIN,
        form = login_form(&state, LoginPresentation::Popover),
        get_started = labels::GET_STARTED,
    )
}

/// Landing page. `popover` carries the header login state after a failed
/// popover submission.
#[must_use]
pub fn landing(popover: Option<&LoginState>) -> String {
    let body = format!(
        r##"{header}
<main>
<section class="hero">
<h1>{headline}</h1>
<p>Transforme seu WhatsApp em um assistente virtual inteligente que gerencia cobranças, atendimento e relacionamento com clientes de forma automática e humanizada.</p>
<a class="cta" href="/onboarding">Comece Gratuitamente</a>
<a href="#demo">Ver demonstração <span aria-hidden="true">→</span></a>
</section>
<section id="features">
<h2>Mais rápido</h2>
<p>Tudo que você precisa para automatizar seu negócio</p>
<p>Gerencie cobranças, atendimento e relacionamento com clientes de forma automática e humanizada com nossa IA.</p>
</section>
</main>
<footer><p>{footer}</p></footer>"##,
        header = site_header(popover),
        headline = locale::SITE_DESCRIPTION,
        footer = labels::FOOTER,
    );
    layout(locale::SITE_TITLE, &body)
}

#[must_use]
pub fn login_page(state: &LoginState) -> String {
    let body = format!(
        r#"<main class="login">
{logo}
<h1>{title}</h1>
<p>{subtitle}</p>
{form}
<p>{prompt} <a href="/signup">{link}</a></p>
</main>"#,
        logo = logo("/"),
        title = labels::LOGIN_TITLE,
        subtitle = labels::LOGIN_SUBTITLE,
        form = login_form(state, LoginPresentation::Page),
        prompt = labels::LOGIN_SIGNUP_PROMPT,
        link = labels::LOGIN_SIGNUP_LINK,
    );
    layout(labels::LOGIN_TITLE, &body)
}

fn signup_field(wizard: &SignupWizard, name: &str, label: &str, kind: FieldKind) -> String {
    // Passwords are never echoed back.
    let value = match kind {
        FieldKind::Password => String::new(),
        _ => escape(wizard.wizard().value(name)),
    };
    let input = match kind.input_type() {
        Some(input_type) => format!(
            r#"<input id="{name}" type="{input_type}" name="{name}" value="{value}" required>"#
        ),
        None => format!(r#"<textarea id="{name}" name="{name}" required>{value}</textarea>"#),
    };
    format!(r#"<label for="{name}">{label}</label>{input}"#)
}

#[must_use]
pub fn signup_page(wizard: &SignupWizard) -> String {
    let step = wizard.wizard().current_step();
    let index = wizard.current_step();
    let last = wizard.wizard().last_index();

    let mut fields = String::new();
    for field in step.fields {
        fields.push_str(&signup_field(wizard, field.name, field.label, field.kind));
    }

    let mut progress = String::new();
    for position in 0..=last {
        let class = if position <= index { "done" } else { "todo" };
        let _ = write!(progress, r#"<span class="{class}"></span>"#);
    }

    let notice = match (&wizard.confirmation_notice, index == last) {
        (Some(notice), true) => format!(r#"<p class="notice">{}</p>"#, escape(notice)),
        _ => String::new(),
    };

    let back = if index > 0 {
        format!(
            r#"<button type="submit" name="action" value="back" formnovalidate>{}</button>"#,
            labels::BACK
        )
    } else {
        String::new()
    };
    let next = if wizard.is_loading {
        labels::PROCESSING
    } else if index == last {
        labels::GO_TO_DASHBOARD
    } else {
        labels::CONTINUE
    };
    let disabled = if wizard.is_loading { " disabled" } else { "" };

    let body = format!(
        r#"<main class="signup">
{logo}
<div class="progress" aria-label="{current} / {total}">{progress}</div>
<h1>{title}</h1>
<p>{description}</p>
{notice}
<form method="post" action="/signup">
{fields}
{error}
{back}
<button type="submit" name="action" value="next"{disabled}>{next}</button>
</form>
</main>"#,
        logo = logo("/"),
        current = index + 1,
        total = last + 1,
        title = step.title,
        description = step.description,
        error = error_alert(wizard.error.as_deref()),
    );
    layout(step.title, &body)
}

#[must_use]
pub fn onboarding_page(tour: OnboardingTour) -> String {
    let step = tour.step();
    let shortcut = step.shortcut.map_or_else(String::new, |(first, second)| {
        format!(
            r#"<div class="shortcut"><p>{SHORTCUT_PROMPT}</p><kbd>{first}</kbd> <kbd>{second}</kbd></div>"#
        )
    });

    let mut dots = String::new();
    for position in 0..TOUR_STEPS.len() {
        let class = if position == tour.current_index() {
            "active"
        } else {
            "idle"
        };
        let _ = write!(dots, r#"<span class="{class}"></span>"#);
    }

    let next = if tour.is_last() {
        labels::GO_TO_DASHBOARD
    } else {
        labels::CONTINUE
    };

    let body = format!(
        r#"<header>{logo}</header>
<main class="onboarding">
<h1>{title}</h1>
<p>{description}</p>
{shortcut}
<form method="post" action="/onboarding">
<input type="hidden" name="step" value="{index}">
<button type="submit">{next}</button>
</form>
<div class="dots">{dots}</div>
</main>"#,
        logo = logo("/"),
        title = step.title,
        description = step.description,
        index = tour.current_index(),
    );
    layout(step.title, &body)
}

#[must_use]
pub fn confirm_page(state: &ConfirmState) -> String {
    let body = match state {
        ConfirmState::Pending | ConfirmState::Confirmed => format!(
            r#"<main class="confirm"><h1>{}</h1><p>{}</p></main>"#,
            labels::CONFIRM_PENDING,
            labels::CONFIRM_PENDING_HINT
        ),
        ConfirmState::Failed(message) => format!(
            r#"<main class="confirm">
<h1>{title}</h1>
<p class="error" role="alert">{message}</p>
<a href="/login">{back}</a>
</main>"#,
            title = labels::CONFIRM_FAILED_TITLE,
            message = escape(message),
            back = labels::BACK_TO_LOGIN,
        ),
    };
    layout(locale::SITE_TITLE, &body)
}

fn user_menu(menu: &UserMenu) -> String {
    let mut details = String::new();
    if let Some(business_name) = &menu.business_name {
        let _ = write!(details, r#"<p class="business">{}</p>"#, escape(business_name));
    }
    if let Some(number) = &menu.whatsapp_number {
        let _ = write!(details, r#"<p class="phone">{}</p>"#, escape(number));
    }

    format!(
        r#"<details class="user-menu">
<summary>{initial}</summary>
<p class="email">{email}</p>
<p class="account">{account}</p>
{details}
<form method="post" action="/logout"><button type="submit">{sign_out}</button></form>
</details>"#,
        initial = escape(&menu.initial),
        email = escape(&menu.email),
        account = labels::ACCOUNT,
        sign_out = labels::SIGN_OUT,
    )
}

/// What the shell shows next to the navigation.
#[derive(Clone, Copy, Debug)]
pub enum DashboardContent {
    Overview,
    Section(&'static NavItem),
    NotFound,
}

fn overview() -> String {
    let mut cards = String::new();
    for stat in &OVERVIEW_STATS {
        let trend = match stat.trend {
            Trend::Up => "up",
            Trend::Down => "down",
        };
        let _ = write!(
            cards,
            r#"<div class="stat {trend}"><dt>{name}</dt><dd>{value}</dd><p><span>{change}</span> {versus}</p></div>"#,
            name = stat.name,
            value = stat.value,
            change = stat.change,
            versus = labels::VERSUS_LAST_MONTH,
        );
    }

    let mut activity = String::new();
    for _ in 0..RECENT_ACTIVITY_ROWS {
        let _ = write!(
            activity,
            "<li><p>{}</p><p>{}</p></li>",
            RECENT_ACTIVITY.0, RECENT_ACTIVITY.1
        );
    }

    format!(
        r#"<h1>{OVERVIEW_TITLE}</h1>
<p>{OVERVIEW_SUBTITLE}</p>
<dl class="stats">{cards}</dl>
<h2>{RECENT_ACTIVITY_TITLE}</h2>
<ul class="activity">{activity}</ul>"#
    )
}

#[must_use]
pub fn dashboard_page(menu: &UserMenu, content: DashboardContent) -> String {
    let active = match content {
        DashboardContent::Overview => NAVIGATION.first(),
        DashboardContent::Section(item) => Some(item),
        DashboardContent::NotFound => None,
    };

    let mut nav = String::new();
    for item in &NAVIGATION {
        let current = if active.is_some_and(|active| std::ptr::eq(active, item)) {
            r#" aria-current="page""#
        } else {
            ""
        };
        let _ = write!(nav, r#"<a href="{}"{current}>{}</a>"#, item.href, item.name);
    }

    let (title, main) = match content {
        DashboardContent::Overview => (OVERVIEW_TITLE, overview()),
        DashboardContent::Section(item) => (item.name, format!("<h1>{}</h1>", item.name)),
        DashboardContent::NotFound => (labels::NOT_FOUND, format!("<h1>{}</h1>", labels::NOT_FOUND)),
    };

    let body = format!(
        r#"<header>
{logo}
<nav>{nav}</nav>
{menu}
</header>
<main class="dashboard">
{main}
</main>"#,
        logo = logo("/dashboard"),
        menu = user_menu(menu),
    );
    layout(title, &body)
}
