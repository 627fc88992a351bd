// Defaults for the remote endpoint and the bounds the UI places on sampling.

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 7860;

pub const MIN_TEMPERATURE: f32 = 0.1;
pub const MAX_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Keeps a user-supplied temperature inside the slider range.
pub fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}
