use crate::generator::ChatTurn;

/// Render the grounded prompt sent to the model.
///
/// Context chunks are joined with newlines. The conversation section lists
/// earlier turns as `User:`/`Bot:` lines followed by the pending question.
pub fn build_prompt(query: &str, context: &[&str], history: &[ChatTurn]) -> String {
    let context = context.join("\n");

    let mut conversation = String::new();
    for turn in history {
        conversation.push_str(&format!("User: {}\n", turn.query));
        conversation.push_str(&format!("Bot: {}\n", turn.answer));
    }
    conversation.push_str(&format!("User: {query}\n"));

    format!(
        "\nYou are an intelligent assistant. Use the context below to answer the user's query concisely.\n\n\
         Context:\n{context}\n\n\
         Conversation History:\n{conversation}\n\n\
         User Query:\n{query}\n\n\
         Answer:\n"
    )
}
