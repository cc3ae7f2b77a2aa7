//! Regexes and the top-level domain list shared by the link matchers.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const HOST: &str = r"(?:[\p{L}\p{N}](?:[\p{L}\p{N}\-]{0,61}[\p{L}\p{N}])?\.)+\p{L}{2,63}";

const IPV4_PART: &str = r"(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";

/// Scheme, credentials, port, path, query and fragment around a host. Path,
/// query and fragment never end on sentence punctuation.
fn with_host(host: &str) -> String {
    let inner = r"\p{L}\p{N}\-_~%+$&*=@/";
    format!(
        concat!(
            r"(?i)(?:(?P<scheme>https?://)(?P<auth>[\w\-]+(?::[\w\-]+)?@)?)?",
            r"(?P<host>{host})",
            r"(?::(?P<port>\d{{1,5}}))?",
            r"(?P<path>/(?:[{inner}.!'(),;:]*[{inner}])?)?",
            r"(?P<query>\?[{inner}.!'(),;:?]*[{inner}])?",
            r"(?P<fragment>#[{inner}.!'(),;:?#]*[{inner}])?",
        ),
        host = host,
        inner = inner,
    )
}

pub(crate) static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&with_host(HOST)).expect("valid regex"));

pub(crate) static IP: LazyLock<Regex> = LazyLock::new(|| {
    let host = format!(r"\b{IPV4_PART}(?:\.{IPV4_PART}){{3}}\b");
    Regex::new(&with_host(&host)).expect("valid regex")
});

pub(crate) static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    let username = r"[\w!$%&'*+/=?^`|~\-]+(?:\.[\w!$%&'*+/=?^`|~\-]+)*";
    Regex::new(&format!(r"(?P<username>{username})@(?P<host>{HOST})")).expect("valid regex")
});

pub(crate) static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?P<hashtag>[\p{L}\p{N}_\-]+)").expect("valid regex"));

const GENERIC_TLDS: &str = "aero app art asia biz blog cat cloud club com coop design dev edu email \
    gov guru info int jobs life link live mil mobi museum name net news online org page post pro \
    shop site space store tech tel travel website wiki world xxx xyz";

const COUNTRY_TLDS: &str = "ac ad ae af ag ai al am ao aq ar as at au aw ax az ba bb bd be bf bg \
    bh bi bj bm bn bo br bs bt bw by bz ca cc cd cf cg ch ci ck cl cm cn co cr cu cv cw cx cy cz \
    de dj dk dm do dz ec ee eg er es et eu fi fj fk fm fo fr ga gd ge gf gg gh gi gl gm gn gp gq \
    gr gs gt gu gw gy hk hm hn hr ht hu id ie il im in io iq ir is it je jm jo jp ke kg kh ki km \
    kn kp kr kw ky kz la lb lc li lk lr ls lt lu lv ly ma mc md me mg mh mk ml mm mn mo mp mq mr \
    ms mt mu mv mw mx my mz na nc ne nf ng ni nl no np nr nu nz om pa pe pf pg ph pk pl pm pn pr \
    ps pt pw py qa re ro rs ru rw sa sb sc sd se sg sh si sk sl sm sn so sr ss st su sv sx sy sz \
    tc td tf tg th tj tk tl tm tn to tr tt tv tw tz ua ug uk us uy uz va vc ve vg vi vn vu wf ws \
    ye yt za zm zw";

static TLDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    GENERIC_TLDS
        .split_whitespace()
        .chain(COUNTRY_TLDS.split_whitespace())
        .collect()
});

/// Whether `tld` (without the dot, any case) is a known top-level domain.
pub fn is_valid_tld(tld: &str) -> bool {
    TLDS.contains(tld.to_ascii_lowercase().as_str())
}

/// Last label of a host name.
pub(crate) fn tld_of(host: &str) -> &str {
    host.rsplit('.').next().unwrap_or(host)
}
