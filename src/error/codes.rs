/// Error code registry for epqc
///
/// Error codes are organized by category:
/// - 1000-1999: Setup errors (settings, log sink)
/// - 2000-2999: Model file errors
/// - 3000-3999: Session errors
/// - 4000-4999: Engine and weather resolution errors
/// - 5000-5999: Execution errors
pub struct ErrorCode;

impl ErrorCode {
    // Setup errors (1000-1999)
    pub const SETTINGS_INVALID: u16 = 1001;
    pub const LOG_OPEN_FAILED: u16 = 1002;

    // Model file errors (2000-2999)
    pub const MODEL_INVALID_FILE: u16 = 2001;
    pub const MODEL_READ_FAILED: u16 = 2002;
    pub const MODEL_VERSION_NOT_FOUND: u16 = 2003;
    pub const MODEL_TIMESTEP_NOT_FOUND: u16 = 2004;
    pub const MODEL_INVALID_TIMESTEP: u16 = 2005;
    pub const MODEL_WRITE_FAILED: u16 = 2006;

    // Session errors (3000-3999)
    pub const SESSION_PERSIST_FAILED: u16 = 3001;

    // Resolution errors (4000-4999)
    pub const RESOLVE_MISSING_ENGINE: u16 = 4001;
    pub const RESOLVE_ENGINE_NOT_RESOLVABLE: u16 = 4002;
    pub const RESOLVE_DICTIONARY_NOT_FOUND: u16 = 4003;
    pub const RESOLVE_INVALID_WEATHER: u16 = 4004;
    pub const RESOLVE_MISSING_WEATHER: u16 = 4005;

    // Execution errors (5000-5999)
    pub const EXEC_SPAWN_FAILED: u16 = 5001;
    pub const EXEC_TIMEOUT: u16 = 5002;
    pub const EXEC_ENGINE_FAILED: u16 = 5003;
}

/// Get a human-readable description of an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Settings file could not be parsed",
        1002 => "Log file could not be opened",

        2001 => "Model file is missing or has the wrong extension",
        2002 => "Model file could not be read",
        2003 => "No Version block found in the model file",
        2004 => "No Timestep block found in the model file",
        2005 => "Timestep value is not one of 1, 2, 4, 6",
        2006 => "Rewritten model file could not be written",

        3001 => "Session state could not be loaded or saved",

        4001 => "No engine given and none stored in the session",
        4002 => "Engine argument is neither an executable nor an installed version",
        4003 => "No dictionary file found for the engine",
        4004 => "Weather file is missing or has the wrong extension",
        4005 => "No weather file given and none stored in the session",

        5001 => "Engine process could not be started",
        5002 => "Engine process timed out",
        5003 => "Engine process exited with a failure status",

        _ => "Unknown error code",
    }
}
