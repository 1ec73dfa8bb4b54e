//! Credential entry screen - login / signup

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password, Select};
use taskline_core::{CredentialMode, TasklineContext};

use crate::output;

pub enum AuthOutcome {
    /// A credential was accepted; the session gate hears about it through
    /// the provider's auth-state stream.
    Submitted,
    Quit,
}

pub async fn run(ctx: &TasklineContext) -> Result<AuthOutcome> {
    let mut flow = ctx.credential_flow();

    loop {
        let (title, submit_label, switch_label) = match flow.mode() {
            CredentialMode::Login => ("Welcome Back", "Login", "Don't have an account? Sign up"),
            CredentialMode::Signup => ("Create Account", "Sign Up", "Already have an account? Login"),
        };

        println!();
        println!("{}", title.bold());
        if let Some(err) = flow.error() {
            output::error(err);
        }

        let action = Select::new()
            .items(&[submit_label, switch_label, "Quit"])
            .default(0)
            .interact()?;

        match action {
            0 => {
                let email: String = Input::new()
                    .with_prompt("Email")
                    .with_initial_text(flow.email().to_string())
                    .allow_empty(true)
                    .interact_text()?;
                flow.set_email(email);

                let password = Password::new()
                    .with_prompt("Password (min 6 characters)")
                    .allow_empty_password(true)
                    .interact()?;
                flow.set_password(password);

                // Mirrors the disabled submit control: nothing reaches the
                // provider until the advisory client checks pass.
                if !flow.can_submit() {
                    output::warning("Enter an email and a password of at least 6 characters.");
                    continue;
                }

                if flow.submit().await {
                    return Ok(AuthOutcome::Submitted);
                }
                // The mapped message prints on the next pass; fields are kept.
            }
            1 => flow.toggle_mode(),
            _ => return Ok(AuthOutcome::Quit),
        }
    }
}
