// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use rickdex_api::CharacterSource;
use rickdex_app::{CharacterPage, QueryKey};
use rickdex_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

pub struct ApiRuntime {
    source: CharacterSource,
}

impl ApiRuntime {
    pub fn new(source: CharacterSource) -> Self {
        Self { source }
    }
}

impl AppRuntime for ApiRuntime {
    fn fetch_characters(&mut self, key: &QueryKey) -> Result<CharacterPage> {
        self.source.fetch(key)
    }

    fn clear_cache(&mut self) -> Result<usize> {
        Ok(self.source.clear_cache())
    }

    fn spawn_fetch(
        &mut self,
        generation: u64,
        key: &QueryKey,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let source = self.source.clone();
        let key = key.clone();
        thread::Builder::new()
            .name(format!("rickdex-fetch-{generation}"))
            .spawn(move || {
                let result = source.fetch(&key).map_err(|error| format!("{error:#}"));
                // The UI may already have quit.
                let _ = tx.send(InternalEvent::Fetched { generation, result });
            })
            .context("spawn fetch worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::{Result, anyhow};
    use rickdex_api::{CharacterSource, Client};
    use rickdex_app::QueryKey;
    use rickdex_testkit::{graphql_body, sample_page};
    use rickdex_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    fn first_page() -> QueryKey {
        QueryKey {
            page: 1,
            filter: None,
        }
    }

    #[test]
    fn spawned_fetch_reports_through_channel() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}/graphql", server.server_addr());

        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            request
                .respond(
                    Response::from_string(graphql_body(&sample_page(1, 42))).with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("valid content type header"),
                    ),
                )
                .expect("response should succeed");
        });

        let client = Client::new(&addr, Duration::from_secs(2))?;
        let mut runtime = ApiRuntime::new(CharacterSource::new(client));
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(7, &first_page(), tx)?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        match event {
            InternalEvent::Fetched { generation, result } => {
                assert_eq!(generation, 7);
                let page = result.map_err(|error| anyhow!(error))?;
                assert_eq!(page.info.pages, 42);
            }
            other => panic!("unexpected event {other:?}"),
        }

        handle.join().expect("server thread should join");
        assert_eq!(runtime.clear_cache()?, 1);
        Ok(())
    }

    #[test]
    fn spawned_fetch_reports_errors_as_text() -> Result<()> {
        let client = Client::new("http://127.0.0.1:1/graphql", Duration::from_millis(50))?;
        let mut runtime = ApiRuntime::new(CharacterSource::new(client));
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(1, &first_page(), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::Fetched { result, .. } => {
                let error = result.expect_err("unreachable endpoint should fail");
                assert!(error.contains("cannot reach"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
