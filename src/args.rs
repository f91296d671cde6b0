use std::str::FromStr;
use anyhow::Result;

pub fn opt<T: FromStr>(arg: Option<&str>) -> Result<Option<T>> {
    Ok(arg.map(|s| T::from_str(s).map_err(|_| {
        let msg  = format!("invalid argument value '{}'", s);
        let kind = clap::ErrorKind::InvalidValue;
        clap::Error::with_description(&msg, kind)
    })).transpose()?)
}

pub fn req<T: FromStr>(arg: Option<&str>, name: &str) -> Result<T> {
    Ok(opt(arg)?.ok_or_else(|| {
        let msg  = format!("missing argument '{}'", name);
        let kind = clap::ErrorKind::MissingRequiredArgument;
        clap::Error::with_description(&msg, kind)
    })?)
}
