use thiserror::Error;

pub type Result<T> = std::result::Result<T, XlsxError>;

/// Every failure the writer reports. The numeric `code()` and message text
/// are stable so a host binding can surface them unchanged.
#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("Memory error, failed to malloc() required memory.")]
    MemoryMallocFailed,

    #[error("Error creating output xlsx file. Usually a permissions error.")]
    CreatingXlsxFile(#[source] std::io::Error),

    #[error("Error encountered when creating a tmpfile during file assembly.")]
    CreatingTmpfile(#[source] std::io::Error),

    #[error("Zlib error with a file operation while creating xlsx file.")]
    ZipFileOperation(String),

    #[error("Zlib error when adding sub file to xlsx file.")]
    ZipFileAdd(String),

    #[error("Zlib error when closing xlsx file.")]
    ZipClose(String),

    #[error("NULL function parameter ignored.")]
    NullParameterIgnored,

    #[error("Function parameter validation error.")]
    ParameterValidation,

    #[error("Worksheet name exceeds Excel's limit of 31 characters.")]
    SheetnameLengthExceeded,

    #[error("Worksheet name contains invalid Excel character: '[]:*?/\\'")]
    InvalidSheetnameCharacter,

    #[error("Worksheet name is already in use.")]
    SheetnameAlreadyUsed,

    #[error("Parameter exceeds Excel's limit of 32 characters.")]
    String32LengthExceeded,

    #[error("Parameter exceeds Excel's limit of 128 characters.")]
    String128LengthExceeded,

    #[error("Parameter exceeds Excel's limit of 255 characters.")]
    String255LengthExceeded,

    #[error("String exceeds Excel's limit of 32,767 characters.")]
    MaxStringLengthExceeded,

    #[error("Error finding internal string index.")]
    SharedStringIndexNotFound,

    #[error("Worksheet row or column index out of range.")]
    WorksheetIndexOutOfRange,

    #[error("Maximum number of worksheet URLs (65530) exceeded.")]
    WorksheetMaxNumberUrlsExceeded,

    #[error("Couldn't read image dimensions or DPI.")]
    ImageDimensions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl XlsxError {
    /// Position of the error in the message table. `0` is reserved for
    /// success; `Io` shares the code of file operation failures.
    pub fn code(&self) -> u8 {
        match self {
            XlsxError::MemoryMallocFailed => 1,
            XlsxError::CreatingXlsxFile(_) => 2,
            XlsxError::CreatingTmpfile(_) => 3,
            XlsxError::ZipFileOperation(_) | XlsxError::Io(_) => 4,
            XlsxError::ZipFileAdd(_) => 5,
            XlsxError::ZipClose(_) => 6,
            XlsxError::NullParameterIgnored => 7,
            XlsxError::ParameterValidation => 8,
            XlsxError::SheetnameLengthExceeded => 9,
            XlsxError::InvalidSheetnameCharacter => 10,
            XlsxError::SheetnameAlreadyUsed => 11,
            XlsxError::String32LengthExceeded => 12,
            XlsxError::String128LengthExceeded => 13,
            XlsxError::String255LengthExceeded => 14,
            XlsxError::MaxStringLengthExceeded => 15,
            XlsxError::SharedStringIndexNotFound => 16,
            XlsxError::WorksheetIndexOutOfRange => 17,
            XlsxError::WorksheetMaxNumberUrlsExceeded => 18,
            XlsxError::ImageDimensions => 19,
        }
    }
}

const ERROR_STRINGS: [&str; 21] = [
    "No error.",
    "Memory error, failed to malloc() required memory.",
    "Error creating output xlsx file. Usually a permissions error.",
    "Error encountered when creating a tmpfile during file assembly.",
    "Zlib error with a file operation while creating xlsx file.",
    "Zlib error when adding sub file to xlsx file.",
    "Zlib error when closing xlsx file.",
    "NULL function parameter ignored.",
    "Function parameter validation error.",
    "Worksheet name exceeds Excel's limit of 31 characters.",
    "Worksheet name contains invalid Excel character: '[]:*?/\\'",
    "Worksheet name is already in use.",
    "Parameter exceeds Excel's limit of 32 characters.",
    "Parameter exceeds Excel's limit of 128 characters.",
    "Parameter exceeds Excel's limit of 255 characters.",
    "String exceeds Excel's limit of 32,767 characters.",
    "Error finding internal string index.",
    "Worksheet row or column index out of range.",
    "Maximum number of worksheet URLs (65530) exceeded.",
    "Couldn't read image dimensions or DPI.",
    "Unknown error number.",
];

/// Translate a numeric error code into its message.
pub fn strerror(code: u8) -> &'static str {
    let idx = (code as usize).min(ERROR_STRINGS.len() - 1);
    ERROR_STRINGS[idx]
}
