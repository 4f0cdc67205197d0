use serde::{Deserialize, Serialize};

/// What kind of value a known field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Patient identity and sample metadata.
    Text,
    /// Continuous lab measurement.
    Measurement,
    /// Serology or hemoglobinopathy result code (0/1 or a small enumeration).
    Coded,
}

/// The fixed vocabulary of blood test fields the extractor is asked for.
///
/// Serialized with the upper-case names used in extraction output and
/// expected-data files (`"HEMOGLOBINA"`, `"VIH"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKey {
    Nombre,
    Apellidos,
    Hospital,
    NroHistoriaClinica,
    NroMuestra,
    Hemoglobina,
    Hematocrito,
    Vcm,
    Ade,
    Plaquetas,
    Leucocitos,
    EosinofilosTotales,
    EosinofilosPorcentaje,
    Glucosa,
    Creatinina,
    Alt,
    Ast,
    Ggt,
    Colesterol,
    Ferritina,
    Vih,
    Vha,
    Vhc,
    Lues,
    Strongyloides,
    Sarampion,
    Schistosoma,
    Hemoglobinopatia,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nombre => "NOMBRE",
            Self::Apellidos => "APELLIDOS",
            Self::Hospital => "HOSPITAL",
            Self::NroHistoriaClinica => "NRO_HISTORIA_CLINICA",
            Self::NroMuestra => "NRO_MUESTRA",
            Self::Hemoglobina => "HEMOGLOBINA",
            Self::Hematocrito => "HEMATOCRITO",
            Self::Vcm => "VCM",
            Self::Ade => "ADE",
            Self::Plaquetas => "PLAQUETAS",
            Self::Leucocitos => "LEUCOCITOS",
            Self::EosinofilosTotales => "EOSINOFILOS_TOTALES",
            Self::EosinofilosPorcentaje => "EOSINOFILOS_PORCENTAJE",
            Self::Glucosa => "GLUCOSA",
            Self::Creatinina => "CREATININA",
            Self::Alt => "ALT",
            Self::Ast => "AST",
            Self::Ggt => "GGT",
            Self::Colesterol => "COLESTEROL",
            Self::Ferritina => "FERRITINA",
            Self::Vih => "VIH",
            Self::Vha => "VHA",
            Self::Vhc => "VHC",
            Self::Lues => "LUES",
            Self::Strongyloides => "STRONGYLOIDES",
            Self::Sarampion => "SARAMPION",
            Self::Schistosoma => "SCHISTOSOMA",
            Self::Hemoglobinopatia => "HEMOGLOBINOPATIA",
        }
    }

    /// Exact, case-sensitive lookup. Extraction output uses the canonical
    /// upper-case names; anything else is an extra field.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Nombre
            | Self::Apellidos
            | Self::Hospital
            | Self::NroHistoriaClinica
            | Self::NroMuestra => FieldKind::Text,
            Self::Vih
            | Self::Vha
            | Self::Vhc
            | Self::Lues
            | Self::Strongyloides
            | Self::Sarampion
            | Self::Schistosoma
            | Self::Hemoglobinopatia => FieldKind::Coded,
            _ => FieldKind::Measurement,
        }
    }

    pub fn all() -> &'static [FieldKey] {
        &[
            Self::Nombre,
            Self::Apellidos,
            Self::Hospital,
            Self::NroHistoriaClinica,
            Self::NroMuestra,
            Self::Hemoglobina,
            Self::Hematocrito,
            Self::Vcm,
            Self::Ade,
            Self::Plaquetas,
            Self::Leucocitos,
            Self::EosinofilosTotales,
            Self::EosinofilosPorcentaje,
            Self::Glucosa,
            Self::Creatinina,
            Self::Alt,
            Self::Ast,
            Self::Ggt,
            Self::Colesterol,
            Self::Ferritina,
            Self::Vih,
            Self::Vha,
            Self::Vhc,
            Self::Lues,
            Self::Strongyloides,
            Self::Sarampion,
            Self::Schistosoma,
            Self::Hemoglobinopatia,
        ]
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
