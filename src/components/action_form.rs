use yew::prelude::*;

/// A titled card whose submit button triggers one controller action.
pub struct ActionForm;

#[derive(Properties, PartialEq)]
pub struct Props {
    pub title: AttrValue,
    pub label: AttrValue,
    /// Disables the button and shows progress while the action is in flight.
    #[prop_or_default]
    pub pending: bool,
    pub on_submit: Callback<()>,
    #[prop_or_default]
    pub children: Html,
}

impl Component for ActionForm {
    type Message = ();
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();
        let on_submit = props.on_submit.clone();
        let onsubmit = Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            on_submit.emit(());
        });

        html! {
            <form class="card" {onsubmit}>
                <h3>{props.title.clone()}</h3>
                {props.children.clone()}
                <button type="submit" disabled={props.pending}>
                    if props.pending {
                        {"Processing..."}
                    } else {
                        {props.label.clone()}
                    }
                </button>
            </form>
        }
    }
}
