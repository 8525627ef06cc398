//! Fixed denylists consulted by the email validator. Kept in-process so the
//! validator stays pure and callable on every keystroke.

/// Domains of known disposable-mail providers. Matched against the full
/// domain, after normalization.
pub(crate) static DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "10minutemail.net",
    "burnermail.io",
    "discard.email",
    "dispostable.com",
    "fakeinbox.com",
    "getnada.com",
    "guerrillamail.com",
    "guerrillamailblock.com",
    "maildrop.cc",
    "mailnesia.com",
    "mailinator.com",
    "mintemail.com",
    "mohmal.com",
    "mytemp.email",
    "sharklasers.com",
    "spamgourmet.com",
    "temp-mail.org",
    "tempinbox.com",
    "tempmail.com",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
    "yopmail.net",
];

/// Placeholder and loopback domains that never belong on a mailing list.
pub(crate) static PLACEHOLDER_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "example.edu",
    "test.com",
    "localhost",
    "localhost.localdomain",
];

/// Reserved TLDs (RFC 2606 and friends) checked as domain suffixes.
pub(crate) static RESERVED_TLD_SUFFIXES: &[&str] =
    &[".test", ".invalid", ".localhost", ".example", ".local"];

/// Local parts that signal a throwaway or test-like signup.
pub(crate) static THROWAWAY_LOCAL_PARTS: &[&str] = &[
    "asdf",
    "asdfasdf",
    "demo",
    "donotreply",
    "do-not-reply",
    "fake",
    "fakeemail",
    "foo",
    "foobar",
    "noreply",
    "no-reply",
    "qwerty",
    "sample",
    "spam",
    "test",
    "test123",
    "tester",
    "testing",
];
