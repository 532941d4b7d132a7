//! Prompt for the LLM line-item step.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::prompt_template`]; the constant here is
//! used only when no override is provided. Either way the document text is
//! substituted for [`DOCUMENT_TEXT_PLACEHOLDER`].

/// Placeholder replaced by the document's full text.
pub const DOCUMENT_TEXT_PLACEHOLDER: &str = "{document_text}";

/// Default line-item prompt, sent as a single system message.
pub const DEFAULT_LINE_ITEM_PROMPT: &str = r#"Extract the following fields from the provided text in JSON format:
- item_description
- item_amount (total amount for all quantity)
- item_subcategory (to which category item belongs if only present for all the items, else NA)
- item-subcategory-total (subtotal which is present for every sub-category in the invoice, else NA)
Return an object with a single key "items" holding the list of items.
Keep the order as it is in the invoice and do not ignore duplicate values if present
Text: {document_text}"#;

/// Fill the prompt template with the document text.
pub fn line_item_prompt(template: Option<&str>, document_text: &str) -> String {
    template
        .unwrap_or(DEFAULT_LINE_ITEM_PROMPT)
        .replace(DOCUMENT_TEXT_PLACEHOLDER, document_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_embeds_text() {
        let p = line_item_prompt(None, "Bolt 1.00");
        assert!(p.ends_with("Text: Bolt 1.00"));
        assert!(p.contains("item_description"));
        assert!(!p.contains(DOCUMENT_TEXT_PLACEHOLDER));
    }

    #[test]
    fn custom_template() {
        let p = line_item_prompt(Some("Items of <<{document_text}>>"), "X");
        assert_eq!(p, "Items of <<X>>");
    }
}
