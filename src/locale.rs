//! User-facing text (pt-BR) and the translation table for auth failures.

use crate::auth::{AuthError, AuthErrorKind};

pub const LANG: &str = "pt-BR";
pub const SITE_TITLE: &str = "Savvy";
pub const SITE_DESCRIPTION: &str = "Automatize seu atendimento com IA no WhatsApp";

pub const MISSING_FIELDS: &str = "Por favor, preencha todos os campos obrigatórios";
pub const INVALID_EMAIL: &str = "Por favor, insira um email válido";
pub const PASSWORD_TOO_SHORT: &str = "A senha deve ter pelo menos 6 caracteres";
pub const PASSWORD_MISMATCH: &str = "As senhas não coincidem";

pub const ALREADY_REGISTERED: &str =
    "Este email já está registrado. Por favor, faça login ou use outro email.";
pub const WEAK_PASSWORD: &str = "A senha deve ter pelo menos 6 caracteres.";
pub const RATE_LIMITED: &str =
    "Muitas tentativas de cadastro. Por favor, aguarde alguns minutos e tente novamente.";
pub const SIGNUP_FAILED: &str = "Erro ao criar conta. Por favor, tente novamente.";
pub const USER_NOT_CREATED: &str = "Erro ao criar usuário. Por favor, tente novamente.";

pub const LOGIN_FAILED: &str = "Erro ao fazer login";

pub const INVALID_CONFIRMATION_LINK: &str = "Link de confirmação inválido";
pub const CONFIRMATION_FAILED: &str = "Erro ao confirmar email";

pub mod labels {
    pub const BACK: &str = "Voltar";
    pub const CONTINUE: &str = "Continuar";
    pub const PROCESSING: &str = "Processando...";
    pub const GO_TO_DASHBOARD: &str = "Ir para Dashboard";

    pub const LOGIN_TITLE: &str = "Bem-vindo de volta";
    pub const LOGIN_SUBTITLE: &str = "Entre na sua conta para acessar o dashboard";
    pub const LOGIN_SUBMIT: &str = "Entrar";
    pub const LOGIN_PENDING: &str = "Entrando...";
    pub const LOGIN_SIGNUP_PROMPT: &str = "Não tem uma conta?";
    pub const LOGIN_SIGNUP_LINK: &str = "Criar conta";
    pub const EMAIL_PLACEHOLDER: &str = "seu@email.com";
    pub const EMAIL: &str = "Email";
    pub const PASSWORD: &str = "Senha";

    pub const CONFIRM_PENDING: &str = "Confirmando seu email...";
    pub const CONFIRM_PENDING_HINT: &str = "Aguarde um momento";
    pub const CONFIRM_FAILED_TITLE: &str = "Erro na confirmação";
    pub const BACK_TO_LOGIN: &str = "Voltar para o login";

    pub const HEADER_LOGIN: &str = "Login";
    pub const GET_STARTED: &str = "Começar Agora";
    pub const ACCOUNT: &str = "Conta Savvy";
    pub const SIGN_OUT: &str = "Sair";
    pub const VERSUS_LAST_MONTH: &str = "vs último mês";
    pub const NOT_FOUND: &str = "Página não encontrada";
    pub const FOOTER: &str = "© 2024 Savvy. Todos os direitos reservados.";
}

/// Text for a failed sign-up call.
///
/// Known kinds are translated; any other backend rejection keeps the backend
/// message, and transport failures fall back to the generic text.
#[must_use]
pub fn signup_error(err: &AuthError) -> String {
    match err.kind() {
        AuthErrorKind::UserAlreadyRegistered => ALREADY_REGISTERED.to_string(),
        AuthErrorKind::WeakPassword => WEAK_PASSWORD.to_string(),
        AuthErrorKind::RateLimited => RATE_LIMITED.to_string(),
        AuthErrorKind::Transport | AuthErrorKind::Unexpected => SIGNUP_FAILED.to_string(),
        _ if err.message().is_empty() => SIGNUP_FAILED.to_string(),
        _ => err.message().to_string(),
    }
}

/// Login failures show the backend message verbatim.
#[must_use]
pub fn login_error(err: &AuthError) -> String {
    if err.is_backend_rejection() && !err.message().is_empty() {
        err.message().to_string()
    } else {
        LOGIN_FAILED.to_string()
    }
}

#[must_use]
pub fn confirmation_error(err: &AuthError) -> String {
    if err.is_backend_rejection() && !err.message().is_empty() {
        err.message().to_string()
    } else {
        CONFIRMATION_FAILED.to_string()
    }
}

#[must_use]
pub fn confirmation_notice(email: &str) -> String {
    format!(
        "Enviamos um link de confirmação para {email}. Verifique sua caixa de entrada para ativar sua conta."
    )
}
