use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliceStation {
    pub name: String,
    pub distance_km: f64,
    pub phone: String,
}

/// Who gets alerted when an emergency is raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyDirectory {
    pub trusted_contacts: Vec<TrustedContact>,
    pub police_stations: Vec<PoliceStation>,
}

impl SafetyDirectory {
    pub fn demo() -> Self {
        Self {
            trusted_contacts: vec![
                contact("Mom - Sunita", "+91 98765 43210"),
                contact("Dad - Rajesh", "+91 98765 43211"),
                contact("Emergency Contact", "+91 98765 43212"),
            ],
            police_stations: vec![
                station("Central Police Station", 1.2, "100"),
                station("Sector 14 Police Post", 2.1, "+91 11 2345 6789"),
                station("Women's Safety Cell", 1.8, "+91 11 2345 6790"),
            ],
        }
    }

    pub fn recipients(&self) -> usize {
        self.trusted_contacts.len() + self.police_stations.len()
    }
}

fn contact(name: &str, phone: &str) -> TrustedContact {
    TrustedContact {
        name: name.to_string(),
        phone: phone.to_string(),
    }
}

fn station(name: &str, distance_km: f64, phone: &str) -> PoliceStation {
    PoliceStation {
        name: name.to_string(),
        distance_km,
        phone: phone.to_string(),
    }
}
