//! Field names shared between layout files, transformation rules and the
//! pattern extractor.

pub const CODE_ENREGISTREMENT: &str = "code_enregistrement";

// Header
pub const DATE_PRODUCTION: &str = "date_production";
pub const NUMERO_DONNEUR_ORDRE: &str = "numero_donneur_ordre";

// Detail
pub const DONNEUR_ORDRE: &str = "donneur_ordre";
pub const DATE_EMISSION: &str = "date_emission";
pub const DATE_TRAITEMENT: &str = "date_traitement";
pub const DATE_EXECUTION: &str = "date_execution";
pub const MONTANT: &str = "montant";
pub const RIB_DONNEUR_ORDRE: &str = "rib_donneur_ordre";
pub const RIB_BENEFICIAIRE: &str = "rib_beneficiaire";
pub const MOTIF_VIREMENT: &str = "motif_virement";
pub const NOM_BENEFICIAIRE: &str = "nom_beneficiaire";
pub const REFERENCE_VIREMENT: &str = "reference_virement";
pub const REFERENCE_REMISE: &str = "reference_remise";

// Footer (status files)
pub const NB_VALEURS: &str = "nb_valeurs";
pub const MONTANT_TOTAL: &str = "montant_total";
pub const NB_VALEURS_PAYEES: &str = "nb_valeurs_payees";

// Footer (integration files)
pub const NOMBRE_TOTAL_VIREMENTS: &str = "nombre_total_virements";
pub const MONTANT_TOTAL_VIREMENTS: &str = "montant_total_virements";
