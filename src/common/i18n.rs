// src/common/i18n.rs

// Catálogo de mensagens de erro por idioma. O código do erro é estável
// (clientes programam contra ele); a mensagem é só apresentação.

#[derive(Clone, Default)]
pub struct I18nStore;

// (código, en, pt)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("tenant_mismatch", "Invalid business context.", "Contexto de estabelecimento inválido."),
    ("slot_taken", "This time slot is already booked.", "Este horário já está agendado."),
    ("time_blocked", "This time is blocked (break / day off).", "Este horário está bloqueado (pausa / folga)."),
    ("outside_working_hours", "Time is outside working hours.", "Horário fora do expediente."),
    ("invalid_service_duration", "Invalid service duration.", "Duração de serviço inválida."),
    ("invalid_range", "End must be after start.", "O fim deve ser depois do início."),
    ("range_too_large", "Blocked period is too large (max 14 days).", "Período bloqueado grande demais (máx. 14 dias)."),
    ("overlap_exists", "An overlapping blocked period already exists.", "Já existe um período bloqueado que se sobrepõe."),
    ("invalid_code", "Invalid verification code.", "Código de verificação inválido."),
    ("code_expired", "Code expired. Please create a new booking.", "Código expirado. Crie um novo agendamento."),
    ("too_many_attempts", "Too many attempts.", "Tentativas demais."),
    ("invalid_transition", "This status change is not allowed.", "Esta mudança de status não é permitida."),
    ("not_found", "Resource not found.", "Recurso não encontrado."),
    ("forbidden", "Forbidden.", "Sem permissão."),
    ("internal", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
];

impl I18nStore {
    pub fn new() -> Self {
        Self
    }

    pub fn message(&self, lang: &str, code: &str) -> String {
        let entry = MESSAGES.iter().find(|(c, _, _)| *c == code);
        match entry {
            Some((_, en, pt)) => {
                if lang == "pt" { (*pt).to_string() } else { (*en).to_string() }
            }
            // Código sem mensagem cadastrada: devolve o próprio código.
            None => code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localizes_known_codes() {
        let store = I18nStore::new();
        assert_eq!(store.message("en", "slot_taken"), "This time slot is already booked.");
        assert_eq!(store.message("pt", "slot_taken"), "Este horário já está agendado.");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.message("hy", "forbidden"), "Forbidden.");
    }

    #[test]
    fn unknown_code_echoes_code() {
        let store = I18nStore::new();
        assert_eq!(store.message("en", "weird_code"), "weird_code");
    }
}
