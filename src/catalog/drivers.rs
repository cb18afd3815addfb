use crate::models::booking::RideClass;
use crate::models::driver::{Driver, DriverId, Review, ACCESSIBLE_SPECIALTY, WOMEN_ONLY_SPECIALTY};

/// Read-only driver provider. Owned by the application state and handed to
/// whoever needs it; nothing mutates entries after construction.
#[derive(Debug, Clone)]
pub struct DriverCatalog {
    drivers: Vec<Driver>,
}

impl DriverCatalog {
    pub fn new(drivers: Vec<Driver>) -> Self {
        Self { drivers }
    }

    /// The demo fleet: general, women-only and accessible drivers.
    pub fn demo() -> Self {
        Self::new(vec![
            Driver {
                id: 1,
                name: "Sarah Johnson".to_string(),
                rating: 4.9,
                experience_years: 5,
                completed_trips: 2847,
                vehicle: "Honda Civic 2021".to_string(),
                plate: "ABC-123".to_string(),
                specialties: strings(&[WOMEN_ONLY_SPECIALTY, ACCESSIBLE_SPECIALTY]),
                languages: strings(&["English", "Spanish"]),
                reviews: vec![
                    review("Very professional and safe driver", 5),
                    review("Always on time and courteous", 5),
                ],
                badges: strings(&["Top Rated", "Safety Expert", "5K+ Rides"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 3,
                price: 12.50,
                safety_score: 98,
            },
            Driver {
                id: 2,
                name: "Michael Chen".to_string(),
                rating: 4.8,
                experience_years: 3,
                completed_trips: 1653,
                vehicle: "Toyota Camry 2020".to_string(),
                plate: "XYZ-789".to_string(),
                specialties: strings(&["Eco-Friendly", "Business"]),
                languages: strings(&["English", "Mandarin"]),
                reviews: vec![
                    review("Smooth ride and great conversation", 5),
                    review("Clean car and punctual", 4),
                ],
                badges: strings(&["Eco Driver", "Business Class"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 5,
                price: 11.75,
                safety_score: 95,
            },
            Driver {
                id: 3,
                name: "Emma Rodriguez".to_string(),
                rating: 4.7,
                experience_years: 2,
                completed_trips: 956,
                vehicle: "Nissan Sentra 2022".to_string(),
                plate: "DEF-456".to_string(),
                specialties: strings(&["Pet-Friendly", "Student"]),
                languages: strings(&["English", "Portuguese"]),
                reviews: vec![
                    review("Great with pets and very patient", 5),
                    review("Affordable and reliable", 4),
                ],
                badges: strings(&["Pet Lover", "New Driver"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 7,
                price: 10.25,
                safety_score: 92,
            },
            Driver {
                id: 4,
                name: "Priya Sharma".to_string(),
                rating: 4.9,
                experience_years: 5,
                completed_trips: 2847,
                vehicle: "Maruti Swift".to_string(),
                plate: "DL 8C 1234".to_string(),
                specialties: strings(&[
                    WOMEN_ONLY_SPECIALTY,
                    "Night rides",
                    "Airport transfers",
                    "Women safety trained",
                ]),
                languages: strings(&["Hindi", "English", "Punjabi"]),
                reviews: vec![review("Felt completely safe on a late ride home", 5)],
                badges: strings(&["Top Rated", "Night Owl"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 3,
                price: 11.00,
                safety_score: 99,
            },
            Driver {
                id: 5,
                name: "Anita Reddy".to_string(),
                rating: 4.8,
                experience_years: 3,
                completed_trips: 1923,
                vehicle: "Hyundai i20".to_string(),
                plate: "TN 09 5678".to_string(),
                specialties: strings(&[
                    WOMEN_ONLY_SPECIALTY,
                    "Long distance",
                    "Student friendly",
                    "Emergency certified",
                ]),
                languages: strings(&["Tamil", "English", "Telugu"]),
                reviews: vec![review("Patient and careful on the highway", 5)],
                badges: strings(&["Emergency Certified"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 5,
                price: 10.50,
                safety_score: 97,
            },
            Driver {
                id: 6,
                name: "Meera Singh".to_string(),
                rating: 4.7,
                experience_years: 4,
                completed_trips: 2156,
                vehicle: "Honda City".to_string(),
                plate: "HR 26 9012".to_string(),
                specialties: strings(&[
                    WOMEN_ONLY_SPECIALTY,
                    "Corporate rides",
                    "Medical emergencies",
                    "Senior citizen friendly",
                ]),
                languages: strings(&["Hindi", "English"]),
                reviews: vec![review("Helped my grandmother with her bags", 5)],
                badges: strings(&["Senior Friendly"]),
                accessibility_features: Vec::new(),
                special_training: Vec::new(),
                estimated_arrival_minutes: 6,
                price: 10.75,
                safety_score: 96,
            },
            Driver {
                id: 7,
                name: "Rajesh Kumar".to_string(),
                rating: 4.9,
                experience_years: 6,
                completed_trips: 3120,
                vehicle: "Toyota Innova (Wheelchair Accessible)".to_string(),
                plate: "DL 4C 5678".to_string(),
                specialties: strings(&[ACCESSIBLE_SPECIALTY]),
                languages: strings(&["Hindi", "English"]),
                reviews: vec![review("Ramp and tie-downs made boarding easy", 5)],
                badges: strings(&["Accessibility Pro"]),
                accessibility_features: strings(&[
                    "Wheelchair ramp",
                    "Tie-down system",
                    "Audio assistance",
                    "Lowered floor",
                    "Wide doors",
                ]),
                special_training: strings(&[
                    "Disability awareness",
                    "Wheelchair assistance",
                    "Medical emergency response",
                    "Patient transfer certified",
                ]),
                estimated_arrival_minutes: 5,
                price: 14.00,
                safety_score: 97,
            },
            Driver {
                id: 8,
                name: "Sunita Yadav".to_string(),
                rating: 4.8,
                experience_years: 4,
                completed_trips: 1788,
                vehicle: "Maruti Ertiga (Modified for Accessibility)".to_string(),
                plate: "HR 26 9013".to_string(),
                specialties: strings(&[ACCESSIBLE_SPECIALTY]),
                languages: strings(&["Hindi", "English"]),
                reviews: vec![review("Guided me to the door, very considerate", 5)],
                badges: strings(&["First Aid Certified"]),
                accessibility_features: strings(&[
                    "Swivel seats",
                    "Hand controls available",
                    "Service animal space",
                    "Voice navigation",
                    "Emergency button",
                ]),
                special_training: strings(&[
                    "Visual impairment assistance",
                    "Hearing impairment support",
                    "Mobility assistance",
                    "First aid certified",
                ]),
                estimated_arrival_minutes: 7,
                price: 13.50,
                safety_score: 96,
            },
        ])
    }

    pub fn all(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn get(&self, id: DriverId) -> Option<&Driver> {
        self.drivers.iter().find(|driver| driver.id == id)
    }

    pub fn eligible(&self, ride_class: RideClass) -> Vec<&Driver> {
        self.drivers
            .iter()
            .filter(|driver| driver.serves(ride_class))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn review(text: &str, rating: u8) -> Review {
    Review {
        text: text.to_string(),
        rating,
    }
}
