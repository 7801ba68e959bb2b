//! Token usage extraction.

use std::collections::BTreeMap;

use crate::client::ChatResponse;

/// Usage counters of a response, keyed `prompt_tokens`, `completion_tokens`
/// and `total_tokens`. Empty when the provider reported no usage.
pub fn get_tokens_usage(response: &ChatResponse) -> BTreeMap<String, u32> {
    let Some(usage) = response.usage else {
        return BTreeMap::new();
    };

    BTreeMap::from([
        ("prompt_tokens".to_string(), usage.prompt_tokens),
        ("completion_tokens".to_string(), usage.completion_tokens),
        ("total_tokens".to_string(), usage.total_tokens),
    ])
}
