//! ISO external purpose codes accepted in the purpose line

/// AT-44 purpose codes, kept sorted for binary search.
pub const PURPOSE_CODES: &[&str] = &[
    "ACCT", "ADVA", "AGRT", "AIRB", "ALMY", "ANNI", "ANTS", "AREN", "BECH", "BENE", "BEXP", "BOCE",
    "BONU", "BUSB", "CASH", "CBFF", "CBTV", "CCRD", "CDBL", "CFEE", "CHAR", "CLPR", "CMDT", "COLL",
    "COMC", "COMM", "COMT", "COST", "CPYR", "CSDB", "CSLP", "CVCF", "DBTC", "DCRD", "DEPT", "DERI",
    "DIVD", "DMEQ", "DNTS", "ELEC", "ENRG", "ESTX", "FERB", "FREX", "GASB", "GDDS", "GDSV", "GOVI",
    "GOVT", "GSCB", "GVEA", "GVEB", "GVEC", "GVED", "HEDG", "HLRP", "HLTC", "HLTI", "HREC", "HSPC",
    "HSTX", "ICCP", "ICRF", "IDCP", "IHRP", "INPC", "INSM", "INSU", "INTC", "INTE", "INTX", "LBRI",
    "LICF", "LIFI", "LIMA", "LOAN", "LOAR", "LTCF", "MDCS", "MSVC", "NETT", "NITX", "NOWS", "NWCH",
    "NWCM", "OFEE", "OTHR", "OTLC", "PADD", "PAYR", "PENS", "PHON", "POPE", "PPTI", "PRCP", "PRME",
    "PTSP", "RCKE", "RCPT", "REFU", "RENT", "RINP", "RLWY", "ROYA", "SALA", "SAVG", "SCVE", "SECU",
    "SSBE", "STDY", "SUBS", "SUPP", "TAXS", "TELI", "TRAD", "TREA", "TRFD", "VATX", "VIEW", "WEBI",
    "WHLD", "WTER",
];

/// Whether `code` (already upper-cased) is a known purpose code.
pub fn is_known(code: &str) -> bool {
    PURPOSE_CODES.binary_search(&code).is_ok()
}
