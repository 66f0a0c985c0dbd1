use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CountryError, FetchError};

/// Countries a job board can be queried for.
///
/// `UsCanada` and `Worldwide` are dispatch groupings (ZipRecruiter and
/// LinkedIn address them as a single region) and never appear in a
/// displayed location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Country {
    Argentina,
    Australia,
    Austria,
    Bahrain,
    Belgium,
    Brazil,
    Canada,
    Chile,
    China,
    Colombia,
    CostaRica,
    CzechRepublic,
    Denmark,
    Ecuador,
    Egypt,
    Finland,
    France,
    Germany,
    Greece,
    HongKong,
    Hungary,
    India,
    Indonesia,
    Ireland,
    Israel,
    Italy,
    Japan,
    Kuwait,
    Luxembourg,
    Malaysia,
    Malta,
    Mexico,
    Morocco,
    Netherlands,
    NewZealand,
    Nigeria,
    Norway,
    Oman,
    Pakistan,
    Panama,
    Peru,
    Philippines,
    Poland,
    Portugal,
    Qatar,
    Romania,
    SaudiArabia,
    Singapore,
    SouthAfrica,
    SouthKorea,
    Spain,
    Sweden,
    Switzerland,
    Taiwan,
    Thailand,
    Turkey,
    Ukraine,
    UnitedArabEmirates,
    Uk,
    Usa,
    Uruguay,
    Venezuela,
    Vietnam,
    UsCanada,
    Worldwide,
}

/// Indeed host prefix and the country code its API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndeedDomain {
    pub subdomain: &'static str,
    pub api_code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlassdoorDomain {
    pub subdomain: &'static str,
    pub tld: &'static str,
}

/// Static facts about one `Country` member. The first alias is the primary one.
#[derive(Debug, Clone, Copy)]
pub struct CountryInfo {
    pub aliases: &'static [&'static str],
    pub indeed: IndeedDomain,
    pub glassdoor: Option<GlassdoorDomain>,
}

const fn indeed(subdomain: &'static str, api_code: &'static str) -> IndeedDomain {
    IndeedDomain { subdomain, api_code }
}

const fn glassdoor(subdomain: &'static str, tld: &'static str) -> Option<GlassdoorDomain> {
    Some(GlassdoorDomain { subdomain, tld })
}

const fn info(
    aliases: &'static [&'static str],
    indeed: IndeedDomain,
    glassdoor: Option<GlassdoorDomain>,
) -> CountryInfo {
    CountryInfo {
        aliases,
        indeed,
        glassdoor,
    }
}

impl Country {
    /// Every member, in enumeration order.
    pub const ALL: &'static [Country] = &[
        Country::Argentina,
        Country::Australia,
        Country::Austria,
        Country::Bahrain,
        Country::Belgium,
        Country::Brazil,
        Country::Canada,
        Country::Chile,
        Country::China,
        Country::Colombia,
        Country::CostaRica,
        Country::CzechRepublic,
        Country::Denmark,
        Country::Ecuador,
        Country::Egypt,
        Country::Finland,
        Country::France,
        Country::Germany,
        Country::Greece,
        Country::HongKong,
        Country::Hungary,
        Country::India,
        Country::Indonesia,
        Country::Ireland,
        Country::Israel,
        Country::Italy,
        Country::Japan,
        Country::Kuwait,
        Country::Luxembourg,
        Country::Malaysia,
        Country::Malta,
        Country::Mexico,
        Country::Morocco,
        Country::Netherlands,
        Country::NewZealand,
        Country::Nigeria,
        Country::Norway,
        Country::Oman,
        Country::Pakistan,
        Country::Panama,
        Country::Peru,
        Country::Philippines,
        Country::Poland,
        Country::Portugal,
        Country::Qatar,
        Country::Romania,
        Country::SaudiArabia,
        Country::Singapore,
        Country::SouthAfrica,
        Country::SouthKorea,
        Country::Spain,
        Country::Sweden,
        Country::Switzerland,
        Country::Taiwan,
        Country::Thailand,
        Country::Turkey,
        Country::Ukraine,
        Country::UnitedArabEmirates,
        Country::Uk,
        Country::Usa,
        Country::Uruguay,
        Country::Venezuela,
        Country::Vietnam,
        Country::UsCanada,
        Country::Worldwide,
    ];

    pub fn info(self) -> CountryInfo {
        use Country::*;
        match self {
            Argentina => info(&["argentina"], indeed("ar", "AR"), glassdoor("www", "com.ar")),
            Australia => info(&["australia"], indeed("au", "AU"), glassdoor("www", "com.au")),
            Austria => info(&["austria"], indeed("at", "AT"), glassdoor("www", "at")),
            Bahrain => info(&["bahrain"], indeed("bh", "BH"), None),
            Belgium => info(&["belgium"], indeed("be", "BE"), glassdoor("fr", "be")),
            Brazil => info(&["brazil"], indeed("br", "BR"), glassdoor("www", "com.br")),
            Canada => info(&["canada"], indeed("ca", "CA"), glassdoor("www", "ca")),
            Chile => info(&["chile"], indeed("cl", "CL"), None),
            China => info(&["china"], indeed("cn", "CN"), None),
            Colombia => info(&["colombia"], indeed("co", "CO"), None),
            CostaRica => info(&["costa rica"], indeed("cr", "CR"), None),
            CzechRepublic => info(&["czech republic", "czechia"], indeed("cz", "CZ"), None),
            Denmark => info(&["denmark"], indeed("dk", "DK"), None),
            Ecuador => info(&["ecuador"], indeed("ec", "EC"), None),
            Egypt => info(&["egypt"], indeed("eg", "EG"), None),
            Finland => info(&["finland"], indeed("fi", "FI"), None),
            France => info(&["france"], indeed("fr", "FR"), glassdoor("www", "fr")),
            Germany => info(&["germany"], indeed("de", "DE"), glassdoor("www", "de")),
            Greece => info(&["greece"], indeed("gr", "GR"), None),
            HongKong => info(&["hong kong"], indeed("hk", "HK"), glassdoor("www", "com.hk")),
            Hungary => info(&["hungary"], indeed("hu", "HU"), None),
            India => info(&["india"], indeed("in", "IN"), glassdoor("www", "co.in")),
            Indonesia => info(&["indonesia"], indeed("id", "ID"), None),
            Ireland => info(&["ireland"], indeed("ie", "IE"), glassdoor("www", "ie")),
            Israel => info(&["israel"], indeed("il", "IL"), None),
            Italy => info(&["italy"], indeed("it", "IT"), glassdoor("www", "it")),
            Japan => info(&["japan"], indeed("jp", "JP"), None),
            Kuwait => info(&["kuwait"], indeed("kw", "KW"), None),
            Luxembourg => info(&["luxembourg"], indeed("lu", "LU"), None),
            Malaysia => info(&["malaysia"], indeed("malaysia", "MY"), glassdoor("www", "com")),
            Malta => info(&["malta"], indeed("malta", "MT"), glassdoor("www", "mt")),
            Mexico => info(&["mexico"], indeed("mx", "MX"), glassdoor("www", "com.mx")),
            Morocco => info(&["morocco"], indeed("ma", "MA"), None),
            Netherlands => info(&["netherlands"], indeed("nl", "NL"), glassdoor("www", "nl")),
            NewZealand => info(&["new zealand"], indeed("nz", "NZ"), glassdoor("www", "co.nz")),
            Nigeria => info(&["nigeria"], indeed("ng", "NG"), None),
            Norway => info(&["norway"], indeed("no", "NO"), None),
            Oman => info(&["oman"], indeed("om", "OM"), None),
            Pakistan => info(&["pakistan"], indeed("pk", "PK"), None),
            Panama => info(&["panama"], indeed("pa", "PA"), None),
            Peru => info(&["peru"], indeed("pe", "PE"), None),
            Philippines => info(&["philippines"], indeed("ph", "PH"), None),
            Poland => info(&["poland"], indeed("pl", "PL"), None),
            Portugal => info(&["portugal"], indeed("pt", "PT"), None),
            Qatar => info(&["qatar"], indeed("qa", "QA"), None),
            Romania => info(&["romania"], indeed("ro", "RO"), None),
            SaudiArabia => info(&["saudi arabia"], indeed("sa", "SA"), None),
            Singapore => info(&["singapore"], indeed("sg", "SG"), glassdoor("www", "sg")),
            SouthAfrica => info(&["south africa"], indeed("za", "ZA"), None),
            SouthKorea => info(&["south korea"], indeed("kr", "KR"), None),
            Spain => info(&["spain"], indeed("es", "ES"), glassdoor("www", "es")),
            Sweden => info(&["sweden"], indeed("se", "SE"), None),
            Switzerland => info(&["switzerland"], indeed("ch", "CH"), glassdoor("de", "ch")),
            Taiwan => info(&["taiwan"], indeed("tw", "TW"), None),
            Thailand => info(&["thailand"], indeed("th", "TH"), None),
            Turkey => info(&["türkiye", "turkey"], indeed("tr", "TR"), None),
            Ukraine => info(&["ukraine"], indeed("ua", "UA"), None),
            UnitedArabEmirates => info(&["united arab emirates"], indeed("ae", "AE"), None),
            Uk => info(&["uk", "united kingdom"], indeed("uk", "GB"), glassdoor("www", "co.uk")),
            Usa => info(&["usa", "us", "united states"], indeed("www", "US"), glassdoor("www", "com")),
            Uruguay => info(&["uruguay"], indeed("uy", "UY"), None),
            Venezuela => info(&["venezuela"], indeed("ve", "VE"), None),
            Vietnam => info(&["vietnam"], indeed("vn", "VN"), glassdoor("www", "com")),
            UsCanada => info(&["usa/ca"], indeed("www", "WWW"), None),
            Worldwide => info(&["worldwide"], indeed("www", "WWW"), None),
        }
    }

    /// Resolve a user-supplied name. Case and surrounding whitespace are ignored.
    pub fn from_alias(alias: &str) -> Result<Country, CountryError> {
        let needle = alias.trim().to_lowercase();
        Country::ALL
            .iter()
            .copied()
            .find(|country| country.aliases().contains(&needle.as_str()))
            .ok_or_else(|| CountryError::InvalidCountry {
                alias: needle,
                valid: Country::ALL
                    .iter()
                    .flat_map(|c| c.aliases().iter().map(|a| a.to_string()))
                    .collect(),
            })
    }

    pub fn aliases(self) -> &'static [&'static str] {
        self.info().aliases
    }

    /// Lowercase primary alias, e.g. "usa" or "czech republic".
    pub fn primary_alias(self) -> &'static str {
        self.info().aliases[0]
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, Country::UsCanada | Country::Worldwide)
    }

    /// Name for display: "USA" and "UK" upper-cased, everything else title-cased.
    pub fn display_name(self) -> String {
        let name = self.primary_alias();
        match name {
            "usa" | "uk" => name.to_uppercase(),
            _ => title_case(name),
        }
    }

    pub fn indeed_domain(self) -> IndeedDomain {
        self.info().indeed
    }

    pub fn glassdoor_host(self) -> Result<String, FetchError> {
        match self.info().glassdoor {
            Some(domain) => Ok(format!("{}.glassdoor.{}", domain.subdomain, domain.tld)),
            None => Err(FetchError::Unsupported {
                site: "glassdoor".to_string(),
                country: self.display_name(),
            }),
        }
    }

    pub fn glassdoor_url(self) -> Result<String, FetchError> {
        Ok(format!("https://{}/", self.glassdoor_host()?))
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primary_alias())
    }
}

impl FromStr for Country {
    type Err = CountryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Country::from_alias(s)
    }
}

impl TryFrom<String> for Country {
    type Error = CountryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Country::from_alias(&value)
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.primary_alias().to_string()
    }
}
