const MAX_IGNORED_QUERY_CHARS: usize = 2;
const MAX_SUGGESTIONS: usize = 5;

const CITIES: &[&str] = &[
    "Mumbai, Maharashtra",
    "Delhi, Delhi",
    "Bangalore, Karnataka",
    "Hyderabad, Telangana",
    "Chennai, Tamil Nadu",
    "Kolkata, West Bengal",
    "Pune, Maharashtra",
    "Ahmedabad, Gujarat",
    "Jaipur, Rajasthan",
    "Surat, Gujarat",
    "Lucknow, Uttar Pradesh",
    "Kanpur, Uttar Pradesh",
    "Nagpur, Maharashtra",
    "Patna, Bihar",
    "Indore, Madhya Pradesh",
    "Thane, Maharashtra",
    "Bhopal, Madhya Pradesh",
    "Visakhapatnam, Andhra Pradesh",
    "Vadodara, Gujarat",
    "Firozabad, Uttar Pradesh",
    "Ludhiana, Punjab",
    "Rajkot, Gujarat",
    "Agra, Uttar Pradesh",
    "Siliguri, West Bengal",
    "Nashik, Maharashtra",
    "Faridabad, Haryana",
    "Patiala, Punjab",
    "Meerut, Uttar Pradesh",
    "Kalyan-Dombivali, Maharashtra",
    "Vasai-Virar, Maharashtra",
    "Varanasi, Uttar Pradesh",
    "Srinagar, Jammu and Kashmir",
    "Dhanbad, Jharkhand",
    "Jodhpur, Rajasthan",
    "Amritsar, Punjab",
    "Raipur, Chhattisgarh",
    "Allahabad, Uttar Pradesh",
    "Coimbatore, Tamil Nadu",
    "Jabalpur, Madhya Pradesh",
    "Gwalior, Madhya Pradesh",
    "Vijayawada, Andhra Pradesh",
    "Madurai, Tamil Nadu",
    "Guwahati, Assam",
    "Chandigarh, Chandigarh",
    "Hubli-Dharwad, Karnataka",
    "Amroha, Uttar Pradesh",
    "Moradabad, Uttar Pradesh",
    "Gurgaon, Haryana",
    "Aligarh, Uttar Pradesh",
    "Solapur, Maharashtra",
    "Ranchi, Jharkhand",
    "Jalandhar, Punjab",
    "Tiruchirappalli, Tamil Nadu",
    "Bhubaneswar, Odisha",
];

/// Static place list backing location autocomplete.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    places: Vec<String>,
}

impl Gazetteer {
    pub fn new(places: Vec<String>) -> Self {
        Self { places }
    }

    pub fn indian_cities() -> Self {
        Self::new(CITIES.iter().map(|city| city.to_string()).collect())
    }

    /// Case-insensitive substring match on the query as typed. Queries of
    /// two characters or fewer return nothing.
    pub fn suggest_places(&self, query: &str) -> Vec<String> {
        if query.chars().count() <= MAX_IGNORED_QUERY_CHARS {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        self.places
            .iter()
            .filter(|place| place.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }
}
