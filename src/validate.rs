//! Profile field validation
//!
//! Pure, synchronous checks producing a field → first-error-message map.
//! Runs on every edit and once more before submit; submission is blocked
//! while the map is non-empty.

use std::collections::BTreeMap;

use crate::types::ProfileForm;

pub type FieldErrors = BTreeMap<&'static str, String>;

/// Validates the whole form at once. Keys are the backend field names.
pub fn validate_profile(form: &ProfileForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.name.trim().is_empty() {
        errors.insert("name", "Nome é obrigatório".to_string());
    } else if form.name.chars().count() < 6 {
        errors.insert(
            "name",
            "O nome deve ter pelo menos 6 caracteres".to_string(),
        );
    }

    if form.cpf.trim().is_empty() {
        errors.insert("cpf", "CPF é obrigatório".to_string());
    } else if !is_valid_cpf(&form.cpf) {
        errors.insert("cpf", "Cpf inválido".to_string());
    }

    if form.organization.trim().is_empty() {
        errors.insert("organization", "organização é necessária".to_string());
    } else if form.organization.chars().count() < 5 {
        errors.insert(
            "organization",
            "A organização deve ter pelo menos 5 caracteres".to_string(),
        );
    }

    if form.city.is_empty() {
        errors.insert("city", "Cidade é necessária".to_string());
    }
    if form.group.is_empty() {
        errors.insert("group", "Grupo é obrigatório".to_string());
    }
    if form.role.is_empty() {
        errors.insert("role", "Função é necessário".to_string());
    }

    if form.email.trim().is_empty() {
        errors.insert("email", "Email é obrigatório".to_string());
    } else if !is_valid_email(&form.email) {
        errors.insert("email", "Email inválido".to_string());
    }

    if form.whats_app.trim().is_empty() {
        errors.insert("whatsApp", "Whatsapp é necessário".to_string());
    } else if !is_valid_mobile(&form.whats_app) {
        errors.insert("whatsApp", "Número de Whatsapp inválido".to_string());
    }

    if form.mobile.trim().is_empty() {
        errors.insert("mobile", "Celular é necessário".to_string());
    } else if !is_valid_mobile(&form.mobile) {
        errors.insert("mobile", "Número de celular inválido".to_string());
    }

    errors
}

/// Brazilian taxpayer-ID checksum. Accepts bare digits or the usual
/// `XXX.XXX.XXX-XX` formatting.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    if digits.len() != 11 {
        return false;
    }
    // Sequences like 111.111.111-11 satisfy the arithmetic but are reserved
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, &d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rem = (sum * 10) % 11;
        if rem == 10 { 0 } else { rem }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// Structural email check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(s: &str) -> bool {
    let mut parts = s.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Display-form mobile number: `AA NNNNNNNNN` where the area code is
/// `1[2-9]` or `[2-9][0-9]` and the subscriber number is nine digits
/// starting 5-9.
pub fn is_valid_mobile(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 12 || b[2] != b' ' {
        return false;
    }
    let area_ok = match (b[0], b[1]) {
        (b'1', second) => (b'2'..=b'9').contains(&second),
        (first, second) => (b'2'..=b'9').contains(&first) && second.is_ascii_digit(),
    };
    area_ok && (b'5'..=b'9').contains(&b[3]) && b[4..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ProfileForm {
        ProfileForm {
            name: "Carlos Pereira".to_string(),
            cpf: "529.982.247-25".to_string(),
            organization: "Polícia Civil".to_string(),
            city: "5ecb5a1d".to_string(),
            group: "5ecb5a2f".to_string(),
            email: "carlos@example.com.br".to_string(),
            whats_app: "12 920155555".to_string(),
            mobile: "85 987654321".to_string(),
            role: "admin".to_string(),
            sms: true,
            whats_app_message: false,
            mail: true,
        }
    }

    #[test]
    fn fully_valid_form_has_no_errors() {
        assert!(validate_profile(&valid_form()).is_empty());
    }

    #[test]
    fn accepts_known_valid_cpfs() {
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("111.444.777-35"));
    }

    #[test]
    fn rejects_bad_cpfs() {
        // wrong check digits
        assert!(!is_valid_cpf("52998224726"));
        assert!(!is_valid_cpf("123.456.789-00"));
        // repeated-digit sequences
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("00000000000"));
        // wrong length / non-digits
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("5299822472X"));
        assert!(!is_valid_cpf(""));
    }

    #[test]
    fn cpf_failures_surface_on_the_cpf_field() {
        let mut form = valid_form();
        form.cpf = "123.456.789-00".to_string();
        let errors = validate_profile(&form);
        assert_eq!(errors.get("cpf").map(String::as_str), Some("Cpf inválido"));

        form.cpf.clear();
        let errors = validate_profile(&form);
        assert_eq!(
            errors.get("cpf").map(String::as_str),
            Some("CPF é obrigatório")
        );
    }

    #[test]
    fn name_and_organization_have_minimum_lengths() {
        let mut form = valid_form();
        form.name = "Ana".to_string();
        form.organization = "PCSP".to_string();
        let errors = validate_profile(&form);
        assert_eq!(
            errors.get("name").map(String::as_str),
            Some("O nome deve ter pelo menos 6 caracteres")
        );
        assert_eq!(
            errors.get("organization").map(String::as_str),
            Some("A organização deve ter pelo menos 5 caracteres")
        );
    }

    #[test]
    fn empty_selections_are_required() {
        let mut form = valid_form();
        form.city.clear();
        form.group.clear();
        form.role.clear();
        let errors = validate_profile(&form);
        assert!(errors.contains_key("city"));
        assert!(errors.contains_key("group"));
        assert!(errors.contains_key("role"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn mobile_shapes() {
        assert!(is_valid_mobile("12 920155555"));
        assert!(is_valid_mobile("85 987654321"));
        assert!(is_valid_mobile("99 512345678"));
        // area codes 10/11 are outside the accepted range
        assert!(!is_valid_mobile("11 912345678"));
        assert!(!is_valid_mobile("10 912345678"));
        // subscriber number must start 5-9
        assert!(!is_valid_mobile("12 420155555"));
        // missing space / wrong length
        assert!(!is_valid_mobile("12920155555"));
        assert!(!is_valid_mobile("12 92015555"));
        assert!(!is_valid_mobile("12 9201555556"));
        assert!(!is_valid_mobile(""));
    }
}
