use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
}

impl Device {
    pub fn new(id: &str, name: &str, device_type: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type: device_type.into(),
        }
    }
}
