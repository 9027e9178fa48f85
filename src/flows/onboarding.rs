//! Post-signup product tour.

use crate::session::{Navigator, Route};

#[derive(Debug)]
pub struct TourStep {
    pub title: &'static str,
    pub description: &'static str,
    pub shortcut: Option<(&'static str, &'static str)>,
}

pub const SHORTCUT_PROMPT: &str = "Experimente abrir o menu de comandos com:";

pub static TOUR_STEPS: [TourStep; 4] = [
    TourStep {
        title: "Command menu",
        description: "Use o menu de comandos para gerenciar seu bot de forma rápida e eficiente.",
        shortcut: Some(("Ctrl", "K")),
    },
    TourStep {
        title: "Configuração do WhatsApp",
        description: "Configure seu número do WhatsApp Business para começar a automatizar seu atendimento.",
        shortcut: None,
    },
    TourStep {
        title: "Personalização do Bot",
        description: "Defina a personalidade e o tom de voz do seu assistente virtual.",
        shortcut: None,
    },
    TourStep {
        title: "Configuração de Pagamentos",
        description: "Configure as integrações de pagamento para automatizar suas cobranças.",
        shortcut: None,
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnboardingTour {
    current: usize,
}

impl OnboardingTour {
    /// Indices past the end clamp to the last step.
    #[must_use]
    pub fn at(step: usize) -> Self {
        Self {
            current: step.min(TOUR_STEPS.len() - 1),
        }
    }

    #[must_use]
    pub fn current_index(self) -> usize {
        self.current
    }

    #[must_use]
    pub fn step(self) -> &'static TourStep {
        &TOUR_STEPS[self.current]
    }

    #[must_use]
    pub fn is_last(self) -> bool {
        self.current == TOUR_STEPS.len() - 1
    }

    /// Advance one step, or leave the tour for the dashboard from the last one.
    #[must_use]
    pub fn next(self, navigator: &dyn Navigator) -> Option<Self> {
        if self.is_last() {
            navigator.push(Route::Dashboard);
            None
        } else {
            Some(Self {
                current: self.current + 1,
            })
        }
    }
}
