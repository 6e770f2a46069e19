/// Password rules for sign-up: at least 6 characters with both upper- and lowercase letters.
#[derive(serde::Serialize, tsify::Tsify, Debug, Clone, Copy, PartialEq, Eq)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheck {
    pub ok: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub is_long: bool,
}

pub const PASSWORD_RULES: &str =
    "Password must be min 6 chars and contain both uppercase & lowercase letters";

pub fn validate_password(password: &str) -> PasswordCheck {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let is_long = password.chars().count() >= 6;
    PasswordCheck {
        ok: has_upper && has_lower && is_long,
        has_upper,
        has_lower,
        is_long,
    }
}
