//! Six-step signup wizard ending in account creation.

use super::wizard::{FieldKind, FieldSpec, StepTemplate, Wizard};
use crate::{
    auth::{AuthBackend, SignUpOptions, SignUpResponse, UserMetadata},
    locale,
    session::{Navigator, Route},
};
use regex::Regex;
use secrecy::SecretString;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Index of the step that collects credentials and creates the account.
pub const CREDENTIALS_STEP: usize = 4;

pub static SIGNUP_STEPS: [StepTemplate; 6] = [
    StepTemplate {
        title: "Bem-vindo ao Savvy",
        description: "Vamos configurar seu bot de WhatsApp em poucos passos.",
        fields: &[],
    },
    StepTemplate {
        title: "Informações do Negócio",
        description: "Conte-nos um pouco sobre sua empresa.",
        fields: &[
            FieldSpec {
                name: "businessName",
                label: "Nome da Empresa",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "businessType",
                label: "Tipo de Negócio",
                kind: FieldKind::Text,
            },
        ],
    },
    StepTemplate {
        title: "Detalhes do WhatsApp",
        description: "Configure sua conta do WhatsApp Business.",
        fields: &[
            FieldSpec {
                name: "whatsappNumber",
                label: "Número do WhatsApp",
                kind: FieldKind::Tel,
            },
            FieldSpec {
                name: "whatsappName",
                label: "Nome de Exibição",
                kind: FieldKind::Text,
            },
        ],
    },
    StepTemplate {
        title: "Personalização do Bot",
        description: "Defina o tom e estilo do seu bot.",
        fields: &[
            FieldSpec {
                name: "botName",
                label: "Nome do Bot",
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "botPersonality",
                label: "Personalidade do Bot",
                kind: FieldKind::TextArea,
            },
        ],
    },
    StepTemplate {
        title: "Criar sua Conta",
        description: "Configure suas credenciais para acessar o dashboard.",
        fields: &[
            FieldSpec {
                name: "email",
                label: "Email",
                kind: FieldKind::Email,
            },
            FieldSpec {
                name: "password",
                label: "Senha",
                kind: FieldKind::Password,
            },
            FieldSpec {
                name: "confirmPassword",
                label: "Confirmar Senha",
                kind: FieldKind::Password,
            },
        ],
    },
    StepTemplate {
        title: "Configuração Concluída",
        description: "Seu bot está pronto para começar! Verifique seu email para confirmar sua conta.",
        fields: &[],
    },
];

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map_err(|err| error!("Failed to compile email pattern: {err}"))
        .ok()
});

/// Addresses are rejected outright if the pattern failed to compile.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

/// State of one signup flow instance.
#[derive(Clone, Debug)]
pub struct SignupWizard {
    wizard: Wizard,
    pub error: Option<String>,
    pub is_loading: bool,
    /// Names the address the confirmation email went to.
    pub confirmation_notice: Option<String>,
}

impl Default for SignupWizard {
    fn default() -> Self {
        Self {
            wizard: Wizard::new(&SIGNUP_STEPS),
            error: None,
            is_loading: false,
            confirmation_notice: None,
        }
    }
}

impl SignupWizard {
    #[must_use]
    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.wizard.current_index()
    }

    fn metadata(&self) -> UserMetadata {
        let value = |name: &str| {
            Some(self.wizard.value(name))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        UserMetadata {
            business_name: value("businessName"),
            business_type: value("businessType"),
            whatsapp_number: value("whatsappNumber"),
            whatsapp_name: value("whatsappName"),
            bot_name: value("botName"),
            bot_personality: value("botPersonality"),
            ..UserMetadata::default()
        }
    }

    /// Local credential checks, in the order the visitor sees them.
    fn account_request(&self) -> Result<AccountRequest, &'static str> {
        let email = self.wizard.value("email");
        let password = self.wizard.value("password");

        if !valid_email(email) {
            return Err(locale::INVALID_EMAIL);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(locale::PASSWORD_TOO_SHORT);
        }
        if password != self.wizard.value("confirmPassword") {
            return Err(locale::PASSWORD_MISMATCH);
        }

        Ok(AccountRequest {
            email: email.to_string(),
            password: SecretString::from(password.to_string()),
            metadata: self.metadata(),
        })
    }
}

struct AccountRequest {
    email: String,
    password: SecretString,
    metadata: UserMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the given step.
    Moved(usize),
    /// Local validation failed; the message is in `error`.
    Rejected(&'static str),
    /// Account creation is already in flight.
    Busy,
    AccountCreated,
    AccountFailed(String),
    /// Advanced past the last step.
    Finished,
}

pub struct SignupFlow {
    state: Mutex<SignupWizard>,
    redirect_to: String,
}

impl SignupFlow {
    /// `redirect_to` is where the confirmation email sends the visitor.
    #[must_use]
    pub fn new(redirect_to: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SignupWizard::default()),
            redirect_to: redirect_to.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SignupWizard> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> SignupWizard {
        self.lock().clone()
    }

    /// Store submitted values for the current step. Ignored while loading.
    pub fn fill<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut state = self.lock();
        if !state.is_loading {
            state.wizard.fill(pairs);
        }
    }

    pub fn retreat(&self) {
        self.lock().wizard.back();
    }

    pub async fn advance(
        &self,
        backend: &dyn AuthBackend,
        navigator: &dyn Navigator,
    ) -> AdvanceOutcome {
        let request = {
            let mut state = self.lock();
            if state.is_loading {
                return AdvanceOutcome::Busy;
            }

            if state.wizard.is_last() {
                navigator.push(Route::Dashboard);
                return AdvanceOutcome::Finished;
            }

            if !state.wizard.missing_fields().is_empty() {
                state.error = Some(locale::MISSING_FIELDS.to_string());
                return AdvanceOutcome::Rejected(locale::MISSING_FIELDS);
            }

            if state.wizard.current_index() != CREDENTIALS_STEP {
                state.error = None;
                state.wizard.forward();
                return AdvanceOutcome::Moved(state.wizard.current_index());
            }

            match state.account_request() {
                Ok(request) => {
                    state.is_loading = true;
                    state.error = None;
                    request
                }
                Err(message) => {
                    state.error = Some(message.to_string());
                    return AdvanceOutcome::Rejected(message);
                }
            }
        };

        let result = backend
            .sign_up(
                &request.email,
                &request.password,
                SignUpOptions {
                    metadata: request.metadata,
                    email_redirect_to: Some(self.redirect_to.clone()),
                },
            )
            .await;

        let mut state = self.lock();
        state.is_loading = false;

        match result {
            Ok(SignUpResponse { user: Some(_), .. }) => {
                info!(email = %request.email, "account created");
                state.wizard.clear_values();
                state.wizard.forward();
                state.confirmation_notice = Some(locale::confirmation_notice(&request.email));
                state.error = None;
                AdvanceOutcome::AccountCreated
            }
            Ok(_) => {
                warn!("sign-up succeeded without a user");
                state.error = Some(locale::USER_NOT_CREATED.to_string());
                AdvanceOutcome::AccountFailed(locale::USER_NOT_CREATED.to_string())
            }
            Err(err) => {
                warn!(kind = ?err.kind(), "sign-up failed: {err}");
                let message = locale::signup_error(&err);
                state.error = Some(message.clone());
                AdvanceOutcome::AccountFailed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{
            AuthError,
            stub::{Calls, StubBackend},
        },
        session::NavigationLog,
    };
    use std::{sync::Arc, time::Duration};

    const REDIRECT: &str = "http://localhost:8080/auth/confirm";

    async fn walk_to_credentials(flow: &SignupFlow, backend: &StubBackend, nav: &NavigationLog) {
        let steps: [&[(&str, &str)]; 4] = [
            &[],
            &[("businessName", "Padaria Ana"), ("businessType", "Padaria")],
            &[("whatsappNumber", "+5511999999999"), ("whatsappName", "Ana")],
            &[("botName", "Bia"), ("botPersonality", "Simpática")],
        ];
        for values in steps {
            flow.fill(values.iter().copied());
            assert!(matches!(
                flow.advance(backend, nav).await,
                AdvanceOutcome::Moved(_)
            ));
        }
        assert_eq!(flow.snapshot().current_step(), CREDENTIALS_STEP);
    }

    fn credentials(email: &str, password: &str, confirm: &str) -> [(&'static str, String); 3] {
        [
            ("email", email.to_string()),
            ("password", password.to_string()),
            ("confirmPassword", confirm.to_string()),
        ]
    }

    #[tokio::test]
    async fn empty_field_keeps_step_and_sets_error() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();

        flow.advance(&backend, &nav).await;
        flow.fill([("businessName", "Padaria Ana")]);
        let outcome = flow.advance(&backend, &nav).await;

        let state = flow.snapshot();
        assert_eq!(outcome, AdvanceOutcome::Rejected(locale::MISSING_FIELDS));
        assert_eq!(state.current_step(), 1);
        assert_eq!(state.error.as_deref(), Some(locale::MISSING_FIELDS));
    }

    #[tokio::test]
    async fn retreat_is_floored_and_keeps_values() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();

        flow.retreat();
        assert_eq!(flow.snapshot().current_step(), 0);

        flow.advance(&backend, &nav).await;
        flow.fill([("businessName", "Padaria Ana")]);
        flow.retreat();

        let state = flow.snapshot();
        assert_eq!(state.current_step(), 0);
        assert_eq!(state.wizard().value("businessName"), "Padaria Ana");
    }

    #[tokio::test]
    async fn short_password_is_rejected_locally() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana@example.com", "abc12", "abc12"));
        let outcome = flow.advance(&backend, &nav).await;

        assert_eq!(outcome, AdvanceOutcome::Rejected(locale::PASSWORD_TOO_SHORT));
        assert_eq!(flow.snapshot().current_step(), CREDENTIALS_STEP);
        assert_eq!(Calls::count(&backend.calls.sign_up), 0);
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected_locally() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana@example.com", "secret123", "secret124"));
        let outcome = flow.advance(&backend, &nav).await;

        assert_eq!(outcome, AdvanceOutcome::Rejected(locale::PASSWORD_MISMATCH));
        assert_eq!(Calls::count(&backend.calls.sign_up), 0);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_locally() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana at example", "secret123", "secret123"));

        assert_eq!(
            flow.advance(&backend, &nav).await,
            AdvanceOutcome::Rejected(locale::INVALID_EMAIL)
        );
    }

    #[tokio::test]
    async fn valid_credentials_reach_completion() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new();
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana@example.com", "secret123", "secret123"));
        let outcome = flow.advance(&backend, &nav).await;

        let state = flow.snapshot();
        assert_eq!(outcome, AdvanceOutcome::AccountCreated);
        assert_eq!(state.current_step(), SIGNUP_STEPS.len() - 1);
        assert!(!state.is_loading);
        assert_eq!(state.wizard().value("password"), "");
        assert!(
            state
                .confirmation_notice
                .is_some_and(|notice| notice.contains("ana@example.com"))
        );
        assert_eq!(Calls::count(&backend.calls.sign_up), 1);

        assert_eq!(flow.advance(&backend, &nav).await, AdvanceOutcome::Finished);
        assert_eq!(nav.destination(), Some(Route::Dashboard));
    }

    #[tokio::test]
    async fn second_advance_while_loading_is_ignored() {
        let (backend, gate) = StubBackend::new().gated();
        let backend = Arc::new(backend);
        let nav = Arc::new(NavigationLog::new());
        let flow = Arc::new(SignupFlow::new(REDIRECT));

        // Walking the earlier steps never touches the backend gate.
        walk_to_credentials(&flow, &backend, &nav).await;
        flow.fill(credentials("ana@example.com", "secret123", "secret123"));

        let first = {
            let (flow, backend, nav) = (flow.clone(), backend.clone(), nav.clone());
            tokio::spawn(async move { flow.advance(backend.as_ref(), nav.as_ref()).await })
        };

        for _ in 0..100 {
            if Calls::count(&backend.calls.sign_up) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(flow.snapshot().is_loading);

        let second = flow.advance(backend.as_ref(), nav.as_ref()).await;
        assert_eq!(second, AdvanceOutcome::Busy);
        assert_eq!(Calls::count(&backend.calls.sign_up), 1);

        gate.notify_one();
        let first = first.await;
        assert!(matches!(first, Ok(AdvanceOutcome::AccountCreated)));
        assert_eq!(Calls::count(&backend.calls.sign_up), 1);
    }

    #[tokio::test]
    async fn backend_errors_are_translated() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new()
            .with_sign_up(Err(AuthError::from_response(422, "User already registered")));
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana@example.com", "secret123", "secret123"));
        let outcome = flow.advance(&backend, &nav).await;

        let state = flow.snapshot();
        assert_eq!(
            outcome,
            AdvanceOutcome::AccountFailed(locale::ALREADY_REGISTERED.to_string())
        );
        assert_eq!(state.current_step(), CREDENTIALS_STEP);
        assert_eq!(state.wizard().value("email"), "ana@example.com");
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn success_without_user_is_an_error() {
        let flow = SignupFlow::new(REDIRECT);
        let backend = StubBackend::new().with_sign_up(Ok(SignUpResponse::default()));
        let nav = NavigationLog::new();
        walk_to_credentials(&flow, &backend, &nav).await;

        flow.fill(credentials("ana@example.com", "secret123", "secret123"));
        flow.advance(&backend, &nav).await;

        assert_eq!(
            flow.snapshot().error.as_deref(),
            Some(locale::USER_NOT_CREATED)
        );
    }

    #[test]
    fn email_pattern() {
        assert!(EMAIL_PATTERN.is_some());
        assert!(valid_email("ana@example.com"));
        assert!(valid_email("ana.maria+loja@padaria.com.br"));
        assert!(!valid_email(""));
        assert!(!valid_email("ana@example"));
        assert!(!valid_email("ana @example.com"));
    }
}
