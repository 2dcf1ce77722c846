//! Single-turn, non-interactive "say" command

use std::error::Error;

use crate::core::app::AppContext;

pub async fn run_say(app: AppContext, prompt: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: neural-interface say <prompt>".into());
    }

    let session = app.new_session();
    let outcome = session.handle_turn(&prompt).await?;
    println!("{}", outcome.reply);
    Ok(())
}
