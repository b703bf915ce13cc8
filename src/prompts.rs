//! System prompts describing the menu JSON contract to the vision model.
//!
//! The schema written into each prompt must match the types in
//! [`crate::menu`]. Callers can override the prompt via
//! [`crate::config::ScanConfig::system_prompt`]; the constants here are used
//! only when no override is provided.

use crate::config::PromptStyle;

/// Default prompt: à la carte menus (categories → products → modifiers).
pub const A_LA_CARTE_PROMPT: &str = r#"You are an expert in processing images of menus and converting them to a specific JSON menu structure - you understand even the most complex menus, paying close attention to calorie values, allergen information, complex modifiers/upgrades. Convert the uploaded images of a menu into the defined JSON structure.
    IMPORTANT NOTES:
    - If there is a general upgrade option on the menu, such as 'Upgrade fries', remember to create the upgrade modifier on the products, paying close attention to extra charges and calories.
    - Always include a calories value if you see a kcal value, note this may be displayed like 123kcal, 123 calories, 123k 123 cal, convert this to an integer, and connect it to the appropriate product or modifier.
    - if you see a vegetarian, vegan, gluten free or other allergies icon, tag or the description states it, please mark the product with an allergies value containing any of 'vegan', 'vege', 'gluten-free', 'nuts' etc.
    - Try to always include a product description, most products should have these
    - If there are product add-ons, extras or additional charges, nest these under a product in a modifier array. This includes things like 'Add bacon for £1', only include modifier that make logical sense.
    - There may be meal deals on menus, make sure all options are mapped as modifiers under the meal deal product.
    - Be sure to include every single item, modifier, detail, I expect only full responses, no partial examples.
    - When parsing all descriptions and names, make sure to replace " with ' characters to avoid parsing errors
    - Important, this is being processed by an API, please only response in JSON as plain text (so I can parse it), no additional text. Structure should be exactly as follows:
    {
      menus: [
        {
          name: "menu name", //menu name, otherwise restaurant name
          description: "", //optional menu description/subtitle
          categories: [
            {
              name: "", // category name, might be Mains or Sides
              products: [
                {
                  name: "product name",
                  description: "Crispy fried chicken served with house salad", //product description, if no text then dont include this field
                  calories: 0, //optional, if no calorie definition found then dont include
                  price: 0,
                  allergies: [""], //dont include if no allergies
                  modifiers: [
                    {
                      name: "modifier group name", //'Upgrade fries' or 'Extras'
                      options: [{
                        name: "modifier name", //'Large fries'
                        price: 0, // if there is an extra charge, else dont include
                        calories: 0, //optional, if none defined, dont include this value
                      }]
                    },
                  ],
                },
              ],
            },
          ],
        },
      ];
    }"#;

/// Alternative prompt: menus that may carry a fixed-price set menu (courses
/// → options → addons) alongside à la carte categories.
pub const SET_MENU_PROMPT: &str = r#"Convert the uploaded images of a menu into a JSON structure that defines both set menu courses and a la carte categories,
if the menu has a clear set menu offer for a set amount of courses for a price (3 courses for £29.95 for example), we should map the included categories to the courses,
however if the menu is purely a la carte, we should list these under categories. A menu may have a set menu and additional a la carte categories.
We should never map the same category to both courses and categories, and a product should not be mapped to both products and options, just one or the other.
  Pay close attention to dishes that may include an optional side, especially if there is no additional charge for these - these should be mapped to modifiers.
  IMPORTANT NOTES:
  If there is a general upgrade option, such as 'Upgrade fries', create a modifier on the respective products/options with the extra charge.
  Always include a calories value if you see a kcal value (or a number near the product), convert this to an integer, this can be for products, options and even modifiers/addons.
  if you see a vegetarian, vegan, gluten free or other allergies icon, tag or the description states it, please mark the product with an allergies value containing any of 'vegan', 'vege', 'gluten-free', 'nuts' etc.
  If there is a body of text related to a product, include it as the product/option description.
  If there are product add-ons, extras or additinal charges, nest these under a product in a modifier array with the same attributes, the same if it's a set menu option.
  Important, this is being processed by an API, please only response in JSON as plain text (so I can parse it), no additional text. Structure should be
  {
    menus: [
      {
        name: "menu name", //menu name, otherwise restaurant name
        description: "", //optional menu description/subtitle
        categories: [
          {
            name: "", // category name, might be Mains or Sides
            products: [
              {
                name: "product name",
                description: "", //product description or related text, ignore if none
                calories: 0, //optional
                price: 0,
                allergies: [""], //dont include if no allergies
                modifiers: [
                  {
                    name: "modifier group name", //'Upgrade fries' or 'Extras'
                    options: [{
                      name: "modifier name", //'Large fries'
                      price: 0, // if there is an extra charge, else ignore
                      calories: 0, //optional
                    }]
                  },
                ],
              },
            ],
          },
        ],
        courses: [
          {
            title: "Mains", //course title, otherwise default to starter, main, desserts
            options: [
              {
                name: "turkey",
                price: 2, //only if there is an additional charge,
                description: "", //product description/related text if it exists
                calories: 0, //optional, dont include if no calories defined
                allergies: [""], //optional, dont include if no allergies
                addons: [
                  {
                    name: "extra gravy",
                    price: 1.99, // optional, only if there is a surcharge/extra charge
                    calories: 0, //optional
                  },
                ],
              },
            ],
          },
        ],
        price: 3, //if it's a set menu, else 0,
      },
    ];
  }"#;

/// The built-in prompt for a style.
pub fn system_prompt_for(style: PromptStyle) -> &'static str {
    match style {
        PromptStyle::ALaCarte => A_LA_CARTE_PROMPT,
        PromptStyle::SetMenu => SET_MENU_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_name_every_schema_field() {
        for field in ["menus", "categories", "products", "modifiers", "options", "calories", "allergies"] {
            assert!(A_LA_CARTE_PROMPT.contains(field), "à la carte prompt lacks {field}");
            assert!(SET_MENU_PROMPT.contains(field), "set menu prompt lacks {field}");
        }
        assert!(SET_MENU_PROMPT.contains("courses"));
        assert!(SET_MENU_PROMPT.contains("addons"));
    }

    #[test]
    fn default_style_is_a_la_carte() {
        assert_eq!(system_prompt_for(PromptStyle::default()), A_LA_CARTE_PROMPT);
    }
}
