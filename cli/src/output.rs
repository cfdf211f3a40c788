use archchat_core::agent::AbortReason;
use archchat_core::{StopReason, TurnEvent, TurnOutcome};
use console::style;
use termimad::MadSkin;

const FALLBACK_WIDTH: usize = 80;

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(FALLBACK_WIDTH)
        .clamp(20, 120)
}

#[derive(Default)]
pub struct Console {
    skin: MadSkin,
}

impl Console {
    pub fn new() -> Self {
        Self {
            skin: MadSkin::default(),
        }
    }

    pub fn separator(&self) {
        println!("{}", style("-".repeat(terminal_width())).dim());
    }

    pub fn header(&self, model_id: &str, tools: &[String]) {
        self.separator();
        println!(
            "  {} {}",
            style("Architecture chat").cyan().bold(),
            style(format!("({model_id})")).dim()
        );
        if tools.is_empty() {
            println!("  {}", style("Tools disabled").dim());
        } else {
            println!("  {} {}", style("Tools:").dim(), tools.join(", "));
        }
        self.separator();
    }

    pub fn footer(&self) {
        self.separator();
        println!("  {}", style("Goodbye!").cyan());
        self.separator();
    }

    pub fn model_response(&self, text: &str) {
        println!();
        self.skin.print_text(text);
        println!();
    }

    pub fn status(&self, text: &str) {
        println!("  {} {}", style("→").green(), text);
    }

    pub fn warn(&self, text: &str) {
        eprintln!("  {} {}", style("!").yellow().bold(), style(text).yellow());
    }

    pub fn error(&self, text: &str) {
        eprintln!("  {} {}", style("✗").red().bold(), text);
    }

    /// Progress while a turn runs. Narration between tool calls is shown as
    /// soon as it arrives.
    pub fn event(&self, event: TurnEvent) {
        match event {
            TurnEvent::GatewayCall { model, messages } => {
                println!(
                    "  {}",
                    style(format!("Calling {model} with {messages} message(s)...")).dim()
                );
            }
            TurnEvent::ModelText(text) => self.model_response(&text),
            TurnEvent::ToolUse { name, input } => {
                let input = serde_json::to_string(&input).unwrap_or_default();
                println!(
                    "  {} {} {}",
                    style("Using tool").magenta(),
                    style(name).magenta().bold(),
                    style(input).dim()
                );
            }
        }
    }

    pub fn outcome(&self, outcome: &TurnOutcome) {
        match outcome {
            TurnOutcome::Completed { answer } => self.model_response(answer),
            TurnOutcome::Stopped { stop_reason, text } => {
                if let Some(text) = text {
                    self.model_response(text);
                }
                self.warn(&stopped_message(stop_reason));
            }
            TurnOutcome::Aborted(reason @ AbortReason::RecursionLimit { .. }) => {
                self.warn(&reason.to_string())
            }
        }
    }
}

fn stopped_message(stop_reason: &StopReason) -> String {
    match stop_reason {
        StopReason::MaxTokens => {
            "The response was cut off because it hit the token limit.".to_string()
        }
        other => format!("The model stopped without a final answer ({other})."),
    }
}
