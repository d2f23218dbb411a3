/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod args;
mod error;

use std::ops::Deref;
use std::process;

use clap::Parser;
use log::{error, info};
use vim25::{ManagedObjectReference, ManagedObjectType, VimPort};
use vsphere_utils::{
    vapi::Session, EsxiClient, EsxiClientFactory, PropertyCollectorHelper,
    VcenterClient, VcenterClientFactory, VimClient,
};

use args::{Args, Command};
pub use error::{Error, Result};

enum Client {
    Vcenter(VcenterClient),
    Esxi(EsxiClient),
}

impl Deref for Client {
    type Target = VimClient;

    fn deref(&self) -> &Self::Target {
        match self {
            Client::Vcenter(client) => client.deref(),
            Client::Esxi(client) => client.deref(),
        }
    }
}

impl Client {
    async fn close(self) {
        match self {
            Client::Vcenter(client) => client.close().await,
            Client::Esxi(client) => client.close().await,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    args.init_logger();

    if let Err(e) = run(&args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = args.connection_config().await?;
    let (username, password) = args.credentials()?;
    let locale = args.locale.as_deref();

    info!("connecting to {}", config.base_url());
    let client = match args.esxi {
        true => Client::Esxi(
            EsxiClientFactory::new(config)
                .await?
                .create_client(username, password, locale)
                .await?,
        ),
        false => Client::Vcenter(
            VcenterClientFactory::new(config)
                .await?
                .create_client(username, password, locale)
                .await?,
        ),
    };

    let res = run_command(&client, &args.command).await;
    client.close().await;
    res
}

async fn run_command(client: &Client, command: &Command) -> Result<()> {
    let helper = client.property_collector().await?;
    match command {
        Command::About => {
            let about = &helper.service_content().about;
            println!("{}", about.full_name);
            println!("  api type:    {}", about.api_type);
            println!("  api version: {}", about.api_version);
            println!("  build:       {}", about.build);
            if let Some(uuid) = &about.instance_uuid {
                println!("  instance:    {}", uuid);
            }
        }
        Command::Find { object_type, name } => {
            let obj = find(&helper, object_type, name).await?;
            println!("{}", obj);
        }
        Command::List { object_type } => {
            let typ = object_type.parse().unwrap_or_else(|e| match e {});
            let root = helper.service_content().root_folder.clone();
            let objects = helper
                .get_objects(&root, &typ, vsphere_utils::DEFAULT_CHUNK_SIZE)
                .await?;
            let mut names = objects.into_iter().collect::<Vec<_>>();
            names.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, refs) in names {
                for obj in refs {
                    println!("{}\t{}", obj, name);
                }
            }
        }
        Command::Properties {
            object_type,
            name,
            paths,
        } => {
            let obj = find(&helper, object_type, name).await?;
            let paths = paths.iter().map(String::as_str).collect::<Vec<_>>();
            let values = helper.fetch_properties(&obj, &paths).await?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Command::PowerOn { vm } => {
            let vm = find(&helper, "VirtualMachine", vm).await?;
            let task = client.vim_port().power_on_vm_task(&vm).await?;
            report_task(&helper, &vm, &task, "powered on").await?;
        }
        Command::PowerOff { vm } => {
            let vm = find(&helper, "VirtualMachine", vm).await?;
            let task = client.vim_port().power_off_vm_task(&vm).await?;
            report_task(&helper, &vm, &task, "powered off").await?;
        }
        Command::Session => match client {
            Client::Vcenter(client) => {
                let session: Session = client.create_stub();
                let info = session
                    .get()
                    .await
                    .map_err(vsphere_utils::Error::Rest)?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            Client::Esxi(_) => return Err(Error::Unsupported("session")),
        },
    }
    Ok(())
}

async fn find(
    helper: &PropertyCollectorHelper<VimPort>,
    object_type: &str,
    name: &str,
) -> Result<ManagedObjectReference> {
    let typ: ManagedObjectType =
        object_type.parse().unwrap_or_else(|e| match e {});
    helper
        .get_moref_by_name(name, &typ)
        .await?
        .ok_or_else(|| Error::NotFound(typ.to_string(), name.to_string()))
}

async fn report_task(
    helper: &PropertyCollectorHelper<VimPort>,
    vm: &ManagedObjectReference,
    task: &ManagedObjectReference,
    action: &str,
) -> Result<()> {
    info!("waiting for {}", task);
    match helper.await_task_completion(task).await? {
        true => println!("{} {}", vm, action),
        false => println!("{}: task {} did not succeed", vm, task),
    }
    Ok(())
}
