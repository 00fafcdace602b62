//! Request/response bodies and the role-card document.

use chrono::{DateTime, Utc};
use rolebook_core::book::Book;
use rolebook_core::role::Role;
use serde::{Deserialize, Serialize};

// ── Pagination ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: u32,
}

fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 10 }

impl Default for ListParams {
    fn default() -> Self {
        Self { page: 1, page_size: 10 }
    }
}

// ── Books ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

/// Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookListResponse {
    pub total: i64,
    pub list: Vec<BookResponse>,
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn to_book_response(book: Book) -> BookResponse {
    BookResponse {
        id: book.id,
        title: book.title,
        author: book.author,
        price: book.price,
        description: book.description,
        created_at: format_timestamp(book.created_at),
        updated_at: format_timestamp(book.updated_at),
    }
}

// ── Roles ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub avatar_url: String,
    pub role_data: RoleCard,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub avatar_url: String,
    pub role_data: RoleCard,
}

/// List rows omit the document; detail responses include it.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub avatar_url: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleListResponse {
    pub total: i64,
    pub list: Vec<RoleResponse>,
}

pub fn to_role_response(role: Role, with_data: bool) -> RoleResponse {
    RoleResponse {
        id: role.id,
        name: role.name,
        avatar_url: role.avatar_url,
        description: role.description,
        created_at: format_timestamp(role.created_at),
        updated_at: format_timestamp(role.updated_at),
        role_data: with_data.then_some(role.role_data),
    }
}

// ── Role-card document ────────────────────────────────────────
//
// Call-of-Cthulhu character sheet. Every field is defaulted so partial
// documents (hand-edited exports, older versions) still parse.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCard {
    pub basic_info: BasicInfo,
    pub attributes: Attributes,
    pub skills: Skills,
    pub inventory: Inventory,
    pub personal_traits: PersonalTraits,
    pub status: Status,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    pub name: String,
    pub gender: String,
    pub age: i32,
    pub occupation: String,
    pub alignment: String,
    pub race: String,
    pub appearance: String,
    pub backstory: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    #[serde(rename = "(STR)")]
    pub strength: i32,
    #[serde(rename = "(CON)")]
    pub constitution: i32,
    #[serde(rename = "(SIZ)")]
    pub size: i32,
    #[serde(rename = "(DEX)")]
    pub dexterity: i32,
    #[serde(rename = "(APP)")]
    pub appearance: i32,
    #[serde(rename = "(INT)")]
    pub intelligence: i32,
    #[serde(rename = "(POW)")]
    pub willpower: i32,
    #[serde(rename = "(EDU)")]
    pub education: i32,
    #[serde(rename = "(LUK)")]
    pub luck: i32,
    pub derived: DerivedAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedAttributes {
    #[serde(rename = "(HP)")]
    pub hp: i32,
    #[serde(rename = "(SAN)")]
    pub san: i32,
    #[serde(rename = "(MP)")]
    pub mp: i32,
    #[serde(rename = "(MOV)")]
    pub mov: i32,
    pub actions: i32,
    #[serde(rename = "loadlimit(kg)")]
    pub load_limit: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub occupational: Vec<Skill>,
    pub general: Vec<Skill>,
    pub magic: Vec<Skill>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub name: String,
    pub value: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub equipments: Vec<Equipment>,
    pub wealth: Wealth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub name: String,
    pub quantity: i32,
    pub ammo: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wealth {
    pub cash: i64,
    pub assets: String,
    #[serde(rename = "creditScore")]
    pub credit_score: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalTraits {
    pub personality: String,
    #[serde(rename = "importantPerson")]
    pub important_person: String,
    #[serde(rename = "importantItem")]
    pub important_item: String,
    #[serde(rename = "specialAbility")]
    pub special_ability: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    #[serde(rename = "currentSAN")]
    pub current_san: i32,
    #[serde(rename = "currentHP")]
    pub current_hp: i32,
    #[serde(rename = "isInjured")]
    pub is_injured: bool,
    #[serde(rename = "isInsane")]
    pub is_insane: bool,
    pub remark: String,
}

/// Short description for list rows, derived from the card.
pub fn role_summary(card: &RoleCard) -> String {
    let info = &card.basic_info;
    let mut parts: Vec<&str> = Vec::new();
    for part in [&info.occupation, &info.race, &info.alignment] {
        if !part.is_empty() {
            parts.push(part);
        }
    }
    parts.join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_card_parses_with_defaults() {
        let card: RoleCard =
            serde_json::from_value(json!({"basic_info": {"name": "Edith"}})).unwrap();
        assert_eq!(card.basic_info.name, "Edith");
        assert_eq!(card.attributes.strength, 0);
        assert!(card.skills.occupational.is_empty());
    }

    #[test]
    fn attribute_keys_use_sheet_notation() {
        let card: RoleCard = serde_json::from_value(json!({
            "attributes": {"(STR)": 65, "derived": {"(HP)": 12, "loadlimit(kg)": 40}}
        }))
        .unwrap();
        assert_eq!(card.attributes.strength, 65);
        assert_eq!(card.attributes.derived.hp, 12);
        assert_eq!(card.attributes.derived.load_limit, 40);

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["attributes"]["(STR)"], 65);
    }

    #[test]
    fn role_summary_joins_non_empty_parts() {
        let mut card = RoleCard::default();
        card.basic_info.occupation = "Archaeologist".into();
        card.basic_info.race = "Human".into();
        assert_eq!(role_summary(&card), "Archaeologist / Human");
        assert_eq!(role_summary(&RoleCard::default()), "");
    }

    #[test]
    fn empty_avatar_is_omitted_from_serialisation() {
        let card = RoleCard::default();
        let value = serde_json::to_value(&card).unwrap();
        assert!(value["basic_info"].get("avatar_url").is_none());
    }

    #[test]
    fn list_params_defaults_match_original_api() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 10);
    }
}
