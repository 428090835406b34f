use serde::{Serialize, Deserialize};

/// Аутентифицированный пользователь платформы.
/// Отсутствие identity переводит бронирование на гостевой путь.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl UserIdentity {
    /// Контакт для платёжного шлюза: email, иначе имя.
    pub fn payer_contact(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| self.display_name.clone())
    }
}
