/// Canonical column names shared by every homogenized table
pub const RA_COLUMN: &str = "RA";
pub const DEC_COLUMN: &str = "DEC";
pub const REDSHIFT_COLUMN: &str = "Redshift";
pub const ORIGIN_COLUMN: &str = "Origin";

// Columns appended by the positional cross-match
pub const GROUP_ID_COLUMN: &str = "GroupID";
pub const GROUP_SIZE_COLUMN: &str = "GroupSize";

// Position columns computed by the catalog aggregator (J2000, degrees)
pub const VIZIER_RA_COLUMN: &str = "_RAJ2000";
pub const VIZIER_DEC_COLUMN: &str = "_DEJ2000";

// Columns of the extragalactic database batch and follow-up tables
pub const NED_OBJECT_NAME_COLUMN: &str = "Object Name";
pub const NED_RA_COLUMN: &str = "RA";
pub const NED_DEC_COLUMN: &str = "DEC";
pub const NED_TYPE_COLUMN: &str = "Type";
pub const NED_REDSHIFT_COLUMN: &str = "Redshift";
pub const NED_FLAG_COLUMN: &str = "Redshift Flag";
pub const NED_UNCERTAINTY_COLUMN: &str = "Published Redshift Uncertainty";

/// Provenance value for rows coming from the extragalactic database
pub const NED_ORIGIN: &str = "NED";

// UCD filters sent with each catalog-aggregator search
pub const REDSHIFT_UCD: &str = "src.redshift*";
pub const VELOCITY_UCD: &str = "spect.dopplerVeloc*|phys.veloc*";

// Table-level metadata keys and descriptions
pub const META_DESCRIPTION: &str = "description";
pub const NED_DESCRIPTION: &str = "NED";
pub const VIZIER_REDSHIFT_DESCRIPTION: &str = "Vizier redshifts";
pub const VIZIER_VELOCITY_DESCRIPTION: &str = "Vizier velocity";
pub const GRAND_DESCRIPTION: &str = "Vizier and NED redshifts";

/// Suffix appended to a column description once velocities became redshifts
pub const CONVERTED_SUFFIX: &str = ", converted to redshift";

// Persisted file stems, relative to `{path}/{name}/{name}`
pub const NED_FILE_SUFFIX: &str = "_NED";
pub const VIZIER_REDSHIFT_FILE_SUFFIX: &str = "_vizier_redshift";
pub const VIZIER_VELOCITY_FILE_SUFFIX: &str = "_vizier_velocity";
pub const GRAND_FILE_SUFFIX: &str = "_online_redshift";
pub const IDENT_FILE_SUFFIX: &str = "_ident";
pub const UNIQUE_FILE_SUFFIX: &str = "_unique";
pub const TABLE_FILE_EXTENSION: &str = "json";

// Defaults for the run configuration
pub const DEFAULT_RADIUS_DEG: f64 = 0.7;
pub const DEFAULT_MATCH_TOLERANCE_ARCSEC: f64 = 1.0;
pub const DEFAULT_UNCERTAINTY: f64 = 0.002;
pub const DEFAULT_TIMEOUT_SECS: u64 = 100 * 60;
pub const DEFAULT_VIZIER_URL: &str = "https://vizier.cds.unistra.fr/viz-bin/asu-tsv";
pub const DEFAULT_NED_URL: &str = "https://ned.ipac.caltech.edu";

/// Environment variable that enables the Prometheus exporter
pub const METRICS_PORT_ENV: &str = "ONLINE_REDSHIFT_METRICS_PORT";
