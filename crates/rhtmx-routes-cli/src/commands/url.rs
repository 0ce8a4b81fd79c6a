use anyhow::Result;
use rhtmx_i18n_router::{Params, RequestContext};
use tracing::debug;

use crate::workspace::Workspace;

pub fn execute(
    workspace: &Workspace,
    id: &str,
    lang: Option<&str>,
    params: Vec<(String, String)>,
    queries: Vec<(String, String)>,
    host: Option<&str>,
) -> Result<()> {
    if workspace.table.get(id).is_none() {
        anyhow::bail!("Unknown route id '{}'", id);
    }

    let mut request = RequestContext::new();
    if let Some(host) = host {
        if !request.set_host(host) {
            anyhow::bail!("Invalid host name '{}'", host);
        }
    }

    let router = workspace.router(request);
    let route = router.url(
        id,
        lang,
        params.into_iter().collect::<Params>(),
        queries.into_iter().collect::<Params>(),
        host.is_some(),
    );

    let url = route.try_url()?;
    debug!(id, lang = route.lang(), "URL generated");
    println!("{}", url);

    Ok(())
}
