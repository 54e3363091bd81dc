//! Built-in model list, used whenever no usable catalog file exists.

use super::{Modality, ModelDescriptor};

const TEXT: &[Modality] = &[Modality::Text];
const TEXT_IMAGE: &[Modality] = &[Modality::Text, Modality::Image];

const BUILTIN: &[(&str, &str, &[Modality])] = &[
    ("deepseek-r1-0528", "bedrock", TEXT),
    ("gemini", "api.navy", TEXT),
    ("mistral-small-3.1-24b-instruct-2503", "scaleway", TEXT),
    ("nova-fast", "bedrock", TEXT),
    ("gpt-4o-mini-2024-07-18", "azure", TEXT_IMAGE),
    ("gpt-4.1-nano-2025-04-14", "azure", TEXT_IMAGE),
    ("gpt-o4-mini-2025-04-16", "api.navy", TEXT),
    ("qwen2.5-coder-32b-instruct", "scaleway", TEXT),
    ("roblox-rp", "bedrock", TEXT),
    ("bidara", "azure", TEXT_IMAGE),
    ("mirexa", "azure", TEXT_IMAGE),
    ("rtist", "azure", TEXT),
    ("mistral-large-2411", "mistral", TEXT),
    ("codestral-2405", "mistral", TEXT),
    ("codestral-2501", "mistral", TEXT),
    ("ministral-3b-2410", "mistral", TEXT),
    ("ministral-8b-2410", "mistral", TEXT),
    ("mistral-large-2402", "mistral", TEXT),
    ("mistral-large-2407", "mistral", TEXT),
    ("mistral-medium", "mistral", TEXT),
    ("mistral-saba-2502", "mistral", TEXT),
    ("mistral-small-2402", "mistral", TEXT),
    ("mistral-small-2409", "mistral", TEXT),
    ("mistral-small-2501", "mistral", TEXT),
    ("mistral-small-2503", "mistral", TEXT),
    ("open-mistral-7b", "mistral", TEXT),
    ("open-mistral-nemo", "mistral", TEXT),
    ("open-mixtral-8x22b", "mistral", TEXT),
    ("open-mixtral-8x7b", "mistral", TEXT),
    ("pixtral-12b-2409", "mistral", TEXT_IMAGE),
    ("pixtral-large-2411", "mistral", TEXT_IMAGE),
    ("deepseek-v3-0324", "nebulablock", TEXT),
    ("deepseek-r1", "nebulablock", TEXT),
    ("l3.3-ms-nevoria-70b", "nebulablock", TEXT),
    ("midnight-rose-70b-v2.0.3", "nebulablock", TEXT),
    ("l3-70b-euryale-v2.1", "nebulablock", TEXT),
    ("l3-8b-stheno-v3.2", "nebulablock", TEXT),
    ("qwen2.5-coder-7b", "nebius", TEXT),
];

pub(super) fn builtin_models() -> Vec<ModelDescriptor> {
    BUILTIN
        .iter()
        .map(|(id, owned_by, modalities)| ModelDescriptor {
            id: (*id).to_string(),
            owned_by: (*owned_by).to_string(),
            modalities: modalities.to_vec(),
        })
        .collect()
}
