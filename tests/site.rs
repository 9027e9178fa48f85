use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use savvy::{
    auth::memory::{MemoryConnector, MemoryDirectory},
    web::{self, AppState, SiteConfig, cookies},
};
use std::{collections::BTreeMap, sync::Arc};
use tower::ServiceExt;
use url::Url;

const EMAIL: &str = "ana@padaria.example";
const PASSWORD: &str = "segredo123";

struct Site {
    app: Router,
    state: AppState,
    directory: MemoryDirectory,
    jar: BTreeMap<String, String>,
}

impl Site {
    fn new() -> Result<Self> {
        let directory = MemoryDirectory::new();
        let connector = Arc::new(MemoryConnector::new(directory.clone()));
        let site = SiteConfig::new(Url::parse("http://localhost:8080")?);
        let state = AppState::new(connector, site);
        Ok(Self {
            app: web::router(state.clone()),
            state,
            directory,
            jar: BTreeMap::new(),
        })
    }

    fn cookie_header(&self) -> String {
        self.jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn store_cookies(&mut self, response: &Response) {
        for header in response.headers().get_all(SET_COOKIE) {
            let Some((pair, attributes)) = header
                .to_str()
                .ok()
                .and_then(|value| value.split_once(';'))
            else {
                continue;
            };
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() || attributes.contains("Max-Age=0") {
                self.jar.remove(name);
            } else {
                self.jar.insert(name.to_string(), value.to_string());
            }
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Result<Response> {
        let response = self.app.clone().oneshot(request).await?;
        self.store_cookies(&response);
        Ok(response)
    }

    async fn get(&mut self, uri: &str) -> Result<Response> {
        let request = Request::builder()
            .uri(uri)
            .header(COOKIE, self.cookie_header())
            .body(Body::empty())?;
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> Result<Response> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(COOKIE, self.cookie_header())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))?;
        self.send(request).await
    }

    async fn complete_signup(&mut self) -> Result<()> {
        let steps: [&[(&str, &str)]; 5] = [
            &[],
            &[("businessName", "Padaria Ana"), ("businessType", "Padaria")],
            &[
                ("whatsappNumber", "+5511999999999"),
                ("whatsappName", "Padaria Ana"),
            ],
            &[("botName", "Aninha"), ("botPersonality", "Simpática")],
            &[
                ("email", EMAIL),
                ("password", PASSWORD),
                ("confirmPassword", PASSWORD),
            ],
        ];

        let page = self.get("/signup").await?;
        assert_eq!(page.status(), StatusCode::OK);
        assert!(!self.jar.contains_key(cookies::SIGNUP_COOKIE));

        for step in steps {
            let response = self.post("/signup", step).await?;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), Some("/signup"));
            assert!(self.jar.contains_key(cookies::SIGNUP_COOKIE));
        }
        Ok(())
    }
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

async fn text(response: Response) -> Result<String> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(body.to_vec())?)
}

#[tokio::test]
async fn signup_confirm_dashboard_logout() -> Result<()> {
    let mut site = Site::new()?;
    site.complete_signup().await?;

    assert_eq!(site.directory.account_count(), 1);
    let page = text(site.get("/signup").await?).await?;
    assert!(page.contains(EMAIL), "confirmation notice names the address");
    assert!(page.contains("Voltar"), "completion step can go back");

    let finished = site.post("/signup", &[]).await?;
    assert_eq!(location(&finished), Some("/dashboard"));
    assert!(!site.jar.contains_key(cookies::SIGNUP_COOKIE));

    // Not confirmed yet, so no session.
    let gated = site.get("/dashboard").await?;
    assert_eq!(location(&gated), Some("/login"));

    let token = site
        .directory
        .pending_confirmation(EMAIL)
        .context("confirmation token issued")?;
    let confirmed = site
        .get(&format!("/auth/confirm?token={token}&type=signup"))
        .await?;
    assert_eq!(confirmed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&confirmed), Some("/dashboard"));
    assert!(site.jar.contains_key(cookies::ACCESS_TOKEN_COOKIE));
    assert!(site.jar.contains_key(cookies::REFRESH_TOKEN_COOKIE));

    let dashboard = site.get("/dashboard").await?;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let html = text(dashboard).await?;
    assert!(html.contains(EMAIL));
    assert!(html.contains("Padaria Ana"));

    let missing = site.get("/dashboard/nope").await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    // A signed-in visitor skips the login form.
    let login = site.get("/login").await?;
    assert_eq!(location(&login), Some("/dashboard"));

    let stale = site.cookie_header();
    let logout = site.post("/logout", &[]).await?;
    assert_eq!(location(&logout), Some("/login"));
    assert!(site.jar.is_empty());

    // Revoked tokens no longer open the dashboard.
    let replay = site
        .send(
            Request::builder()
                .uri("/dashboard")
                .header(COOKIE, stale)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(location(&replay), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn login_after_confirmation() -> Result<()> {
    let mut site = Site::new()?;
    site.complete_signup().await?;

    let unconfirmed = site
        .post("/login", &[("email", EMAIL), ("password", PASSWORD)])
        .await?;
    assert_eq!(unconfirmed.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(text(unconfirmed).await?.contains("Email not confirmed"));

    let token = site
        .directory
        .pending_confirmation(EMAIL)
        .context("confirmation token issued")?;
    let mut other_browser = Site {
        app: site.app.clone(),
        state: site.state.clone(),
        directory: site.directory.clone(),
        jar: BTreeMap::new(),
    };
    other_browser
        .get(&format!("/auth/confirm?token={token}&type=signup"))
        .await?;

    let wrong = site
        .post("/login", &[("email", EMAIL), ("password", "errada")])
        .await?;
    assert_eq!(wrong.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = text(wrong).await?;
    assert!(html.contains("Invalid login credentials"));
    assert!(html.contains(EMAIL), "email is kept in the form");
    assert!(!site.jar.contains_key(cookies::ACCESS_TOKEN_COOKIE));

    let signed_in = site
        .post("/login", &[("email", EMAIL), ("password", PASSWORD)])
        .await?;
    assert_eq!(location(&signed_in), Some("/dashboard"));
    assert!(site.jar.contains_key(cookies::ACCESS_TOKEN_COOKIE));

    let dashboard = site.get("/dashboard").await?;
    assert_eq!(dashboard.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn signup_rejects_bad_credentials_locally() -> Result<()> {
    let mut site = Site::new()?;
    site.get("/signup").await?;
    for step in [
        vec![],
        vec![("businessName", "Padaria Ana"), ("businessType", "Padaria")],
        vec![("whatsappNumber", "+5511999999999"), ("whatsappName", "Ana")],
        vec![("botName", "Aninha"), ("botPersonality", "Simpática")],
    ] {
        site.post("/signup", &step).await?;
    }

    site.post(
        "/signup",
        &[
            ("email", EMAIL),
            ("password", "abc12"),
            ("confirmPassword", "abc12"),
        ],
    )
    .await?;

    let page = text(site.get("/signup").await?).await?;
    assert!(page.contains("A senha deve ter pelo menos 6 caracteres"));
    assert_eq!(site.directory.account_count(), 0);

    let back = site.post("/signup", &[("action", "back")]).await?;
    assert_eq!(location(&back), Some("/signup"));
    let page = text(site.get("/signup").await?).await?;
    assert!(page.contains("Personalização do Bot"));
    Ok(())
}

#[tokio::test]
async fn signup_page_without_cookie_stores_nothing() -> Result<()> {
    let mut site = Site::new()?;
    for _ in 0..500 {
        let page = site.get("/signup").await?;
        assert_eq!(page.status(), StatusCode::OK);
        assert!(text(page).await?.contains("Bem-vindo ao Savvy"));
    }
    assert!(site.jar.is_empty());
    assert!(site.state.wizards().is_empty().await);

    site.post("/signup", &[]).await?;
    assert_eq!(site.state.wizards().len().await, 1);
    Ok(())
}

#[tokio::test]
async fn signup_back_keeps_typed_values() -> Result<()> {
    let mut site = Site::new()?;
    site.post("/signup", &[]).await?;

    let back = site
        .post(
            "/signup",
            &[
                ("businessName", "Padaria Ana"),
                ("businessType", "Padaria"),
                ("action", "back"),
            ],
        )
        .await?;
    assert_eq!(location(&back), Some("/signup"));
    let page = text(site.get("/signup").await?).await?;
    assert!(page.contains("Bem-vindo ao Savvy"));

    site.post("/signup", &[]).await?;
    let page = text(site.get("/signup").await?).await?;
    assert!(page.contains("Padaria Ana"), "business name survives going back");
    Ok(())
}

#[tokio::test]
async fn malformed_confirmation_link() -> Result<()> {
    let mut site = Site::new()?;

    let response = site.get("/auth/confirm?type=signup").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await?.contains("Link de confirmação inválido"));

    let response = site.get("/auth/confirm?token=unknown&type=signup").await?;
    assert!(
        text(response)
            .await?
            .contains("Token has expired or is invalid")
    );
    assert!(site.jar.is_empty());
    Ok(())
}

#[tokio::test]
async fn onboarding_tour_ends_on_dashboard() -> Result<()> {
    let mut site = Site::new()?;

    let first = site.get("/onboarding").await?;
    assert_eq!(first.status(), StatusCode::OK);

    let next = site.post("/onboarding", &[("step", "0")]).await?;
    assert_eq!(location(&next), Some("/onboarding?step=1"));

    let last = (savvy::flows::onboarding::TOUR_STEPS.len() - 1).to_string();
    let done = site.post("/onboarding", &[("step", last.as_str())]).await?;
    assert_eq!(location(&done), Some("/dashboard"));
    Ok(())
}

#[tokio::test]
async fn landing_and_health() -> Result<()> {
    let mut site = Site::new()?;

    let landing = site.get("/").await?;
    assert_eq!(landing.status(), StatusCode::OK);
    assert!(text(landing).await?.contains("lang=\"pt-BR\""));

    let health = site.get("/health").await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("X-App"));
    assert!(health.headers().contains_key("x-request-id"));
    Ok(())
}
