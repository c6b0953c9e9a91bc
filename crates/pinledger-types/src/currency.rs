//! Currency → numeric call-code table.
//!
//! An issuer's base currency determines the four-digit prefix of every pin
//! it mints. Lookup is case-insensitive; the table is sorted by ISO code so
//! lookups are a binary search.

/// `(ISO 4217 code, call code)` pairs, sorted by code.
const CALL_CODES: &[(&str, u16)] = &[
    ("AED", 971),
    ("AFN", 93),
    ("ALL", 355),
    ("AMD", 374),
    ("ANG", 1721),
    ("AOA", 244),
    ("ARS", 54),
    ("AUD", 688),
    ("AWG", 297),
    ("AZN", 994),
    ("BAM", 387),
    ("BBD", 1246),
    ("BDT", 880),
    ("BGN", 359),
    ("BHD", 973),
    ("BIF", 257),
    ("BMD", 1441),
    ("BND", 673),
    ("BOB", 591),
    ("BRL", 55),
    ("BSD", 1242),
    ("BTN", 975),
    ("BWP", 267),
    ("BYR", 375),
    ("BZD", 501),
    ("CAD", 1),
    ("CDF", 243),
    ("CHE", 41),
    ("CHF", 423),
    ("CLF", 56),
    ("CNY", 86),
    ("COP", 57),
    ("CRC", 506),
    ("CUC", 53),
    ("CVE", 238),
    ("CZK", 420),
    ("DJF", 253),
    ("DKK", 299),
    ("DOP", 1809),
    ("DZD", 213),
    ("EGP", 20),
    ("ERN", 291),
    ("ETB", 251),
    ("EUR", 34),
    ("FJD", 679),
    ("FKP", 500),
    ("GBP", 44),
    ("GEL", 995),
    ("GHS", 233),
    ("GIP", 350),
    ("GMD", 220),
    ("GNF", 224),
    ("GTQ", 502),
    ("GYD", 592),
    ("HKD", 852),
    ("HNL", 504),
    ("HRK", 385),
    ("HTG", 509),
    ("HUF", 36),
    ("IDR", 62),
    ("ILS", 970),
    ("INR", 91),
    ("IQD", 964),
    ("IRR", 98),
    ("ISK", 354),
    ("JMD", 1876),
    ("JOD", 962),
    ("JPY", 81),
    ("KES", 254),
    ("KGS", 996),
    ("KHR", 855),
    ("KMF", 269),
    ("KPW", 850),
    ("KRW", 82),
    ("KWD", 965),
    ("KYD", 1345),
    ("KZT", 76),
    ("LAK", 856),
    ("LBP", 961),
    ("LKR", 94),
    ("LRD", 231),
    ("LSL", 266),
    ("LYD", 218),
    ("MAD", 212),
    ("MDL", 373),
    ("MGA", 261),
    ("MKD", 389),
    ("MMK", 95),
    ("MNT", 976),
    ("MOP", 853),
    ("MRO", 222),
    ("MUR", 230),
    ("MVR", 960),
    ("MWK", 265),
    ("MXN", 52),
    ("MYR", 60),
    ("MZN", 258),
    ("NAD", 264),
    ("NGN", 234),
    ("NIO", 505),
    ("NOK", 4779),
    ("NPR", 977),
    ("NZD", 690),
    ("OMR", 968),
    ("PAB", 507),
    ("PEN", 51),
    ("PGK", 675),
    ("PHP", 63),
    ("PKR", 92),
    ("PLN", 48),
    ("PYG", 595),
    ("QAR", 974),
    ("RON", 40),
    ("RSD", 381),
    ("RUB", 7),
    ("RWF", 250),
    ("SAR", 966),
    ("SCR", 248),
    ("SDB", 677),
    ("SDG", 249),
    ("SEK", 46),
    ("SGD", 65),
    ("SHP", 290),
    ("SLL", 232),
    ("SOS", 252),
    ("SRD", 597),
    ("SSP", 211),
    ("STD", 239),
    ("SVC", 503),
    ("SYP", 963),
    ("SZL", 268),
    ("THB", 66),
    ("TJS", 992),
    ("TMT", 993),
    ("TND", 216),
    ("TOP", 676),
    ("TRY", 90),
    ("TTD", 1868),
    ("TWD", 886),
    ("TZS", 255),
    ("UAH", 380),
    ("UGX", 256),
    ("USD", 263),
    ("UYI", 598),
    ("UZS", 998),
    ("VEF", 58),
    ("VND", 84),
    ("VUV", 678),
    ("WST", 685),
    ("XAF", 241),
    ("XCD", 1784),
    ("XOF", 228),
    ("XPF", 681),
    ("YER", 967),
    ("ZAR", 27),
    ("ZMK", 260),
];

/// Numeric call code for an ISO currency code, if supported.
#[must_use]
pub fn call_code(currency: &str) -> Option<u16> {
    let upper = currency.trim().to_ascii_uppercase();
    CALL_CODES
        .binary_search_by(|(code, _)| (*code).cmp(upper.as_str()))
        .ok()
        .map(|idx| CALL_CODES[idx].1)
}

/// Whether the currency can serve as an issuer's base currency.
#[must_use]
pub fn is_supported(currency: &str) -> bool {
    call_code(currency).is_some()
}

/// All supported currency codes, sorted.
pub fn supported_currencies() -> impl Iterator<Item = &'static str> {
    CALL_CODES.iter().map(|(code, _)| *code)
}
