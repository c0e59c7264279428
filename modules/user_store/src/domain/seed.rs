use crate::contract::model::NewUser;

const SAMPLE: [(&str, &str, &str, &str); 8] = [
    ("Juan Pérez", "juan.perez@company.com", "IT", "Developer"),
    ("María García", "maria.garcia@company.com", "IT", "Team Lead"),
    ("Carlos López", "carlos.lopez@company.com", "HR", "Recruiter"),
    ("Ana Martínez", "ana.martinez@company.com", "Marketing", "Designer"),
    ("Luis Rodríguez", "luis.rodriguez@company.com", "IT", "DevOps"),
    ("Elena Sánchez", "elena.sanchez@company.com", "Finance", "Analyst"),
    ("Pedro Gómez", "pedro.gomez@company.com", "Sales", "Account Manager"),
    ("Laura Fernández", "laura.fernandez@company.com", "HR", "Manager"),
];

/// Users inserted at startup when `seed_sample_users` is enabled.
pub fn sample_users() -> Vec<NewUser> {
    SAMPLE
        .iter()
        .map(|(name, email, department, role)| NewUser::new(*name, *email, *department, *role))
        .collect()
}
