use serde::{Deserialize, Serialize};

use super::macros::string_id;

string_id! {
    pub struct EmployeeId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: String,
}
